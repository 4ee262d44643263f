use std::sync::Arc;

use crate::auth::oauth::OAuthAuthenticator;
use crate::auth::Authenticator;
use crate::config::Config;
use crate::plan::QuotaGate;
use crate::skills::SkillEngine;
use crate::upload::TextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once at startup; the taxonomy inside is read-only.
    pub engine: Arc<SkillEngine>,
    /// Hosted provider or OAuth sessions, selected by AUTH_PROVIDER.
    pub authenticator: Arc<dyn Authenticator>,
    /// Set only in OAuth mode. Backs the sign-in and callback routes.
    pub oauth: Option<Arc<OAuthAuthenticator>>,
    pub quota: Arc<dyn QuotaGate>,
    pub text_extractor: Arc<dyn TextExtractor>,
}
