//! Output stream setup via cpal.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};

use super::voices::MixerCore;

/// Build and start an output stream rendering through the shared
/// mixer. Returns the live stream and its sample rate.
pub fn build_output(core: Arc<Mutex<MixerCore>>) -> Result<(Stream, u32), String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "No output device available".to_string())?;

    let config = device
        .default_output_config()
        .map_err(|e| format!("Failed to get output config: {}", e))?;

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let stream_config: StreamConfig = config.into();

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                if let Ok(mut mixer) = core.lock() {
                    mixer.render(data, channels);
                } else {
                    data.fill(0.0);
                }
            },
            |err| {
                log::error!(target: "audio", "Output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| format!("Failed to build output stream: {}", e))?;

    stream
        .play()
        .map_err(|e| format!("Failed to start output stream: {}", e))?;

    Ok((stream, sample_rate))
}
