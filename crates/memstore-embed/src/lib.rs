//! Embedding generation clients.
//!
//! [`OpenAiEmbedder`] calls OpenAI or an Azure OpenAI deployment;
//! [`FakeEmbedder`] is a deterministic offline stand-in selected with
//! `embedding.use_fake` (`APP_USE_FAKE_EMBEDDINGS=1`).

mod fake;
mod openai;

pub use fake::FakeEmbedder;
pub use memstore_core::traits::Embedder;
pub use openai::OpenAiEmbedder;

use memstore_core::config::EmbeddingSettings;
use memstore_core::error::Result;

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake {
        println!("🧪 Using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.dimensions)));
    }
    let embedder = OpenAiEmbedder::from_settings(settings)?;
    println!("🔌 Embedding model: {}", embedder.model_id());
    Ok(Box::new(embedder))
}
