//! CalDAV calendar source for calnow.

pub mod caldav;
pub mod ics;
pub mod source;

pub use source::CalDavSource;
