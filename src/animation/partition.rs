use std::path::PathBuf;

use crate::apis::google_aistudio::{GenerateContentResponse, ResponsePart};
use crate::utilities::frame_store::{self, FrameError, FrameStore};
use crate::utilities::text_utils::TruncateWithEllipsis;

#[derive(Debug, Default)]
pub struct Partition {
    pub frames: Vec<PathBuf>,
    pub texts: Vec<String>,
}

/// Walks the parts of the first candidate in order, printing text and saving
/// images as frames. A response without candidates yields an empty partition.
pub fn partition(
    response: GenerateContentResponse,
    store: &mut FrameStore,
) -> Result<Partition, FrameError> {
    let mut partition = Partition::default();

    log::info!("number of candidates: {}", response.candidates.len());

    let Some(candidate) = response.candidates.into_iter().next() else {
        log::error!("no candidates returned in the response");
        return Ok(partition);
    };

    if let Some(finish_reason) = &candidate.finish_reason {
        log::debug!("finish reason: {finish_reason}");
    }

    let parts = candidate.content.map(|content| content.parts).unwrap_or_default();
    log::info!("number of parts in first candidate: {}", parts.len());

    for (part, index) in parts.into_iter().zip(1..) {
        match ResponsePart::from(part) {
            ResponsePart::Text(text) => {
                log::info!("text content: {}", text.clone().truncate_with_ellipsis(100));
                println!("{text}");
                partition.texts.push(text);
            }
            ResponsePart::Image(blob) => {
                log::debug!("decoding {} frame from part {index}", blob.mime_type);
                let image = frame_store::decode_image(&blob.data)?;
                partition.frames.push(store.save(&image)?);
            }
            ResponsePart::Unsupported => {
                log::warn!("part {index} has neither text nor inline data");
            }
        }
    }

    Ok(partition)
}
