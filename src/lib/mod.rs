//! Backend of a bulk personalized mailer: a live log feed and the mailing
//! pipeline that reports into it.
pub mod app;
pub mod log_feed;
pub mod mailing;
