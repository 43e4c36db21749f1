use crate::classifier::BertForAdClassification;

/// Shared application state, loaded once at startup
pub struct AppState {
    pub classifier: BertForAdClassification,
}
