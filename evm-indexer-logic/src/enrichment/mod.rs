//! Method/event identification against static signature catalogs, plus the
//! account/contract metric accumulation those identifications feed.

pub mod event_signatures;
pub mod method_signatures;

pub use event_signatures::{identify_event, EventSignature};
pub use method_signatures::{identify_method, MethodSignature, MethodType};
