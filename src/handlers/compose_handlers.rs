//! The `compose` command: image + logo + QR into one PNG, downloaded or
//! shared.

use super::AppState;
use crate::services::composer::{
    Composer, Composition, Delivered, Delivery, ImageSource, Layout,
};
use anyhow::{Context, Result, bail};

const DEFAULT_STEM: &str = "media-qr";

#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    /// Record whose image and deep link fill in missing inputs.
    pub id: Option<String>,
    pub source: Option<String>,
    pub payload: Option<String>,
    pub share: bool,
    pub data_url: bool,
}

/// Inputs after filling gaps from the record.
#[derive(Debug, PartialEq, Eq)]
struct ResolvedInputs {
    source: ImageSource,
    payload: String,
    stem: String,
}

pub async fn compose(state: &AppState, request: ComposeRequest) -> Result<String> {
    let inputs = resolve_inputs(state, &request).await?;

    let mut composer = Composer::new(state.http.clone(), Layout::default());
    if let Some(logo) = &state.config.logo {
        let image = Composer::load_logo(logo)
            .await
            .with_context(|| format!("loading logo {}", logo.display()))?;
        composer = composer.with_logo(&image);
    }

    let share_target = state.share_target();
    let delivery = if request.share {
        Delivery::Share(share_target.as_ref())
    } else {
        Delivery::Download(&state.config.output_dir)
    };

    let (composition, delivered) = composer
        .compose_and_deliver(&inputs.source, &inputs.payload, &inputs.stem, delivery)
        .await
        .context("composing image")?;

    let mut lines = vec![match &delivered {
        Delivered::Saved(path) => format!("Saved {}", path.display()),
        Delivered::Shared { file_name } => format!("Shared {}", file_name),
    }];
    if let Some(note) = degraded_note(&composition) {
        lines.push(note.to_string());
    }
    if request.data_url {
        lines.push(composition.to_data_url());
    }
    Ok(lines.join("\n"))
}

async fn resolve_inputs(state: &AppState, request: &ComposeRequest) -> Result<ResolvedInputs> {
    let Some(id) = request.id.as_deref() else {
        return match (&request.source, &request.payload) {
            (Some(source), Some(payload)) => Ok(ResolvedInputs {
                source: ImageSource::parse(source),
                payload: payload.clone(),
                stem: DEFAULT_STEM.to_string(),
            }),
            _ => bail!("without a record id, pass both --source and --payload"),
        };
    };

    let media = state.media();
    let payload = request
        .payload
        .clone()
        .unwrap_or_else(|| media.deep_link(id));
    let source = match &request.source {
        Some(source) => source.clone(),
        None => {
            let record = media
                .fetch_record(id)
                .await
                .with_context(|| format!("fetching media {}", id))?;
            match record.image_url() {
                Some(url) => url.to_string(),
                None => bail!("media {} has no image to compose", id),
            }
        }
    };

    Ok(ResolvedInputs {
        source: ImageSource::parse(&source),
        payload,
        stem: format!("media-{}", id),
    })
}

fn degraded_note(composition: &Composition) -> Option<&'static str> {
    match composition {
        Composition::Composite(_) => None,
        Composition::QrOnly(_) => Some("source image unavailable; saved the QR code alone"),
        Composition::SourceOnly(_) => Some("QR code could not be encoded; saved the image alone"),
    }
}
