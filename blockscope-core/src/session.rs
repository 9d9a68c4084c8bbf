use crate::config::EngineConfig;
use crate::detail::{BlockDetail, block_detail};
use crate::engine::analyze;
use crate::error::{EngineError, Result};
use crate::icon::normalize_svg;
use crate::model::DetectionResult;
use blockscope_fetch::{DocumentFetcher, ResourceNames, SsrDocumentSet};
use futures::future::join_all;
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Host-owned handle for analysing one page.
///
/// Lifecycle: `new` → `load_documents`/`set_documents` → `run_analysis`
/// (any number of times) → `dispose`. `run_analysis` takes `&mut self`, so
/// two runs can never overlap on one session.
pub struct Session {
    id: String,
    page_url: String,
    config: EngineConfig,
    fetcher: DocumentFetcher,
    documents: SsrDocumentSet,
    live: Option<Html>,
    result: Option<DetectionResult>,
}

impl Session {
    pub fn new(page_url: &str, config: EngineConfig) -> Result<Self> {
        Url::parse(page_url).map_err(|e| EngineError::InvalidUrl(format!("{}: {}", page_url, e)))?;
        let fetcher = DocumentFetcher::with_timeout(config.fetch_timeout_secs)?;
        let id = Uuid::new_v4().to_string();
        debug!("Session {} created for {}", id, page_url);

        Ok(Self {
            id,
            page_url: page_url.to_string(),
            documents: SsrDocumentSet::new(page_url),
            config,
            fetcher,
            live: None,
            result: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn documents(&self) -> &SsrDocumentSet {
        &self.documents
    }

    /// Fetch a fresh SSR document set. Individual fetch failures leave the set
    /// smaller; only an unusable page URL is an error.
    pub async fn load_documents(&mut self) -> Result<&SsrDocumentSet> {
        self.documents = self.fetcher.fetch_document_set(&self.page_url).await?;
        info!(
            "Session {}: {} SSR document(s) loaded",
            self.id,
            self.documents.len()
        );
        Ok(&self.documents)
    }

    /// Replace the SSR document set with one the host built itself.
    pub fn set_documents(&mut self, documents: SsrDocumentSet) {
        self.documents = documents;
    }

    /// Analyse a live snapshot against the current document set, replacing
    /// any previous result. On error no result remains.
    pub async fn run_analysis(
        &mut self,
        live_html: &str,
        names: &ResourceNames,
    ) -> Result<&DetectionResult> {
        self.result = None;
        self.live = None;

        let live = Html::parse_document(live_html);
        let mut result = analyze(&live, &self.documents, names, &self.config)?;
        self.live = Some(live);

        self.fetch_icon_svgs(&mut result).await;
        Ok(self.result.insert(result))
    }

    /// Fetch SVGs for icons that had no inline markup, concurrently.
    async fn fetch_icon_svgs(&self, result: &mut DetectionResult) {
        let pending: Vec<(usize, String)> = result
            .icons
            .iter()
            .enumerate()
            .filter(|(_, icon)| icon.needs_fetch())
            .filter_map(|(index, icon)| icon.url.clone().map(|url| (index, url)))
            .collect();
        if pending.is_empty() {
            return;
        }

        let fetches = pending.iter().map(|(index, url)| async move {
            (*index, url, self.fetcher.fetch_svg(url).await)
        });
        for (index, url, outcome) in join_all(fetches).await {
            match outcome {
                Ok(svg) => result.icons[index].svg = Some(normalize_svg(&svg, self.config.icon_size)),
                Err(e) => warn!("Icon SVG unavailable from {}: {}", url, e),
            }
        }
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        self.result.as_ref()
    }

    /// Original and live markup for a section or block of the current result.
    pub fn block_detail(&self, id: &str) -> Result<BlockDetail> {
        let (Some(result), Some(live)) = (&self.result, &self.live) else {
            return Err(EngineError::UnknownItem(id.to_string()));
        };
        block_detail(result, live, &self.documents, id)
            .ok_or_else(|| EngineError::UnknownItem(id.to_string()))
    }

    pub fn dispose(self) {
        debug!("Session {} disposed", self.id);
    }
}
