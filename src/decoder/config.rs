//! Decoder configuration and builder.

use serde::Deserialize;

use super::FrameDecoder;
use crate::{
    buffer::{BufferProvider, DEFAULT_MIN_CAPACITY, HeapBufferProvider},
    cumulation::Cumulation,
    dispatch::FanOut,
    strategy::DecodeStrategy,
};

/// Tunables for a [`FrameDecoder`].
///
/// Deserializable so it can be embedded in an application's configuration;
/// missing fields take their defaults.
///
/// ```
/// use framestream::{DecoderConfig, FanOut};
///
/// let config = DecoderConfig::default();
/// assert_eq!(config.min_capacity, 256);
/// assert_eq!(config.fan_out, FanOut::Single);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Smallest capacity requested for any cumulation buffer.
    pub min_capacity: usize,
    /// How collections of frames are dispatched.
    pub fan_out: FanOut,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            min_capacity: DEFAULT_MIN_CAPACITY,
            fan_out: FanOut::default(),
        }
    }
}

/// Builder for [`FrameDecoder`]. Created by [`FrameDecoder::builder`].
pub struct FrameDecoderBuilder<S, P = HeapBufferProvider> {
    strategy: S,
    provider: P,
    config: DecoderConfig,
}

impl<S> FrameDecoderBuilder<S> {
    pub(crate) fn new(strategy: S) -> Self {
        Self {
            strategy,
            provider: HeapBufferProvider,
            config: DecoderConfig::default(),
        }
    }
}

impl<S, P> FrameDecoderBuilder<S, P> {
    /// Set the minimum cumulation buffer capacity.
    #[must_use]
    pub fn min_capacity(mut self, min_capacity: usize) -> Self {
        self.config.min_capacity = min_capacity;
        self
    }

    /// Enable or disable unfolding of frame collections.
    #[must_use]
    pub fn unfold(mut self, enabled: bool) -> Self {
        self.config.fan_out = if enabled {
            FanOut::Unfold
        } else {
            FanOut::Single
        };
        self
    }

    /// Set the fan-out mode.
    #[must_use]
    pub fn fan_out(mut self, fan_out: FanOut) -> Self {
        self.config.fan_out = fan_out;
        self
    }

    /// Replace all tunables at once.
    #[must_use]
    pub fn config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Allocate cumulation buffers through `provider`.
    #[must_use]
    pub fn buffer_provider<Q: BufferProvider>(self, provider: Q) -> FrameDecoderBuilder<S, Q> {
        FrameDecoderBuilder {
            strategy: self.strategy,
            provider,
            config: self.config,
        }
    }

    /// Finish building the decoder.
    #[must_use]
    pub fn build(self) -> FrameDecoder<S, P>
    where
        S: DecodeStrategy,
        P: BufferProvider,
    {
        FrameDecoder::from_parts(
            self.strategy,
            Cumulation::new(self.provider, self.config.min_capacity),
            self.config.fan_out,
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::DecoderConfig;
    use crate::dispatch::FanOut;

    #[rstest]
    #[case("{}", DecoderConfig::default())]
    #[case(
        r#"{"min_capacity": 1024, "fan_out": "unfold"}"#,
        DecoderConfig { min_capacity: 1024, fan_out: FanOut::Unfold }
    )]
    #[case(
        r#"{"fan_out": "single"}"#,
        DecoderConfig { min_capacity: 256, fan_out: FanOut::Single }
    )]
    fn deserializes_with_defaults(#[case] json: &str, #[case] expected: DecoderConfig) {
        let config: DecoderConfig = serde_json::from_str(json).expect("valid config");
        assert_eq!(config, expected);
    }
}
