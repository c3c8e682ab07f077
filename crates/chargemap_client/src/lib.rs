//! Chargemap client library
//!
//! Collaborator plumbing around the session model: the station-search HTTP
//! client, the periodic refresh poller and the push-channel pump.

mod poller;
mod push;
mod search;

pub use crate::poller::{Poller, SharedSession};
pub use crate::push::run_push_channel;
pub use crate::search::{
    MockStationSearch, RestStationSearch, SearchConfig, SearchError, SearchParams, SearchResponse,
    StationSearch,
};
