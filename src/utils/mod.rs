pub mod cancel;
pub mod helpers;
