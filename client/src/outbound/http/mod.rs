//! HTTP outbound adapter.
//!
//! This module provides a thin JSON-over-HTTP implementation of the
//! `QuestService` port.

mod dto;
mod http_quest_service;

pub use http_quest_service::HttpQuestService;
