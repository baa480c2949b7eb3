//! Sound service client
//!
//! POSTs a [`SoundRequest`] as multipart form data and decodes the audio the
//! service sends back. Runs detached from the frame loop; the result lands in
//! the manager's [`FireSoundSlot`](super::FireSoundSlot) whenever it arrives.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext, Blob, FormData, RequestInit, Response};

use super::SoundRequest;
use super::web::AudioManager;
use crate::error::SoundServiceError;

/// Upload name for recorded clips
const CLIP_FILENAME: &str = "recording.webm";

fn form_for(request: &SoundRequest) -> Result<FormData, SoundServiceError> {
    let form = FormData::new()?;
    match request {
        SoundRequest::Clip(bytes) => {
            let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes.as_slice()));
            let blob = Blob::new_with_u8_array_sequence(&parts)?;
            form.append_with_blob_and_filename(request.field_name(), &blob, CLIP_FILENAME)?;
        }
        SoundRequest::Text(text) => {
            form.append_with_str(request.field_name(), text)?;
        }
    }
    Ok(form)
}

/// Send one request and decode the returned audio
pub async fn fetch_fire_sound(
    url: &str,
    request: SoundRequest,
    ctx: &AudioContext,
) -> Result<AudioBuffer, SoundServiceError> {
    let request = request.validate()?;
    let window = web_sys::window().ok_or_else(|| SoundServiceError::Js("no window".into()))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&form_for(&request)?);

    let response: Response = JsFuture::from(window.fetch_with_str_and_init(url, &init))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(SoundServiceError::Http {
            status: response.status(),
        });
    }

    let bytes = JsFuture::from(response.array_buffer()?).await?;
    let bytes: js_sys::ArrayBuffer = bytes.dyn_into()?;
    log::info!("Sound service returned {} bytes", bytes.byte_length());

    let decoded = JsFuture::from(
        ctx.decode_audio_data(&bytes)
            .map_err(|e| SoundServiceError::Decode(format!("{:?}", e)))?,
    )
    .await
    .map_err(|e| SoundServiceError::Decode(format!("{:?}", e)))?;
    decoded
        .dyn_into::<AudioBuffer>()
        .map_err(|e| SoundServiceError::Decode(format!("{:?}", e)))
}

/// Fire-and-forget: request a new fire sound and install it on success
pub fn request_fire_sound(audio: Rc<RefCell<AudioManager>>, url: String, request: SoundRequest) {
    let ctx = audio.borrow().context().cloned();
    audio.borrow_mut().fire_slot_mut().begin_request();
    log::info!("Requesting custom fire sound from {}", url);

    wasm_bindgen_futures::spawn_local(async move {
        let result = match ctx {
            Some(ctx) => fetch_fire_sound(&url, request, &ctx).await,
            None => Err(SoundServiceError::Js("audio is disabled".into())),
        };
        audio.borrow_mut().fire_slot_mut().complete(result);
    });
}
