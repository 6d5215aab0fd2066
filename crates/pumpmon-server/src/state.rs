use pumpmon::agent::Agent;
use pumpmon::store::DataStore;
use pumpmon::suggestions::SuggestionGenerator;
use std::sync::Arc;

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DataStore>,
    pub agent: Agent,
    pub suggestions: Arc<SuggestionGenerator>,
}
