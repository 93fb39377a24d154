// ============================================================
// Adapter - Grid Editor
// ============================================================
// Implements DataEditor by launching the in-crate editor server.
// The returned session's wait() joins the server thread.

use std::path::PathBuf;

use anyhow::Result;

use crate::data::loader::CsvLoader;
use crate::domain::{artifacts::EditSession, traits::DataEditor};
use crate::editor::EditorServer;
use crate::infra::config::EditorConfig;

pub struct GridEditorAdapter {
    loader: CsvLoader,
    config: EditorConfig,
}

impl GridEditorAdapter {
    pub fn new(data_dir: impl Into<PathBuf>, config: EditorConfig) -> Self {
        Self { loader: CsvLoader::new(data_dir), config }
    }
}

impl DataEditor for GridEditorAdapter {
    fn edit(&self, csv_filename: &str) -> Result<EditSession> {
        let (path, table) = self.loader.load(csv_filename)?;
        let server = EditorServer::launch(table, path.clone(), &self.config.host, self.config.port)?;
        let url = server.url.clone();
        Ok(EditSession::new(url, path).with_waiter(move || server.wait()))
    }
}
