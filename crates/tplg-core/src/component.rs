//! Widget descriptors and per-kind component loaders
//!
//! Each loader turns one widget's private tuple data into the semantic
//! descriptor for its kind. Kinds that move audio through shared buffers
//! also run the common component-config token table for the stream-format
//! fields. Loaders are pure: (widget, pipeline id, component id) in,
//! descriptor or error out.

use thiserror::Error;
use tracing::debug;

use crate::tokens::{parse_tokens, TokenEntry, TokenError};
use crate::wire::{RawWidget, WidgetKind};

#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("invalid control count {count} for volume widget, expected 1")]
    InvalidControlCount { count: u32 },
    #[error(transparent)]
    Token(#[from] TokenError),
}

// Token ids. Shared component-config tokens live in the 400 range, per-kind
// tokens in their own blocks.
const TKN_BUF_SIZE: u32 = 100;
const TKN_BUF_CAPS: u32 = 101;
const TKN_DAI_DMAC_CONFIG: u32 = 153;
const TKN_DAI_TYPE: u32 = 154;
const TKN_DAI_INDEX: u32 = 155;
const TKN_SCHED_DEADLINE: u32 = 200;
const TKN_SCHED_PRIORITY: u32 = 201;
const TKN_SCHED_MIPS: u32 = 202;
const TKN_SCHED_CORE: u32 = 203;
const TKN_SCHED_FRAMES: u32 = 204;
const TKN_SCHED_TIMER: u32 = 205;
const TKN_VOLUME_RAMP_STEP_TYPE: u32 = 250;
const TKN_VOLUME_RAMP_STEP_MS: u32 = 251;
const TKN_SRC_RATE_IN: u32 = 300;
const TKN_SRC_RATE_OUT: u32 = 301;
const TKN_PCM_DMAC_CONFIG: u32 = 353;
const TKN_COMP_PERIOD_SINK_COUNT: u32 = 400;
const TKN_COMP_PERIOD_SOURCE_COUNT: u32 = 401;
const TKN_COMP_FORMAT: u32 = 402;
const TKN_COMP_PRELOAD_COUNT: u32 = 403;

/// Frame sample formats carried by the shared component config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameFormat {
    #[default]
    S16le,
    S24le,
    S32le,
    Float,
}

impl FrameFormat {
    /// Look up a named format. Unrecognized names deliberately resolve to
    /// s32le so newer topologies keep decoding.
    pub fn from_name(name: &str) -> Self {
        match name {
            "s16le" => FrameFormat::S16le,
            "s24le" => FrameFormat::S24le,
            "s32le" => FrameFormat::S32le,
            "float" => FrameFormat::Float,
            _ => FrameFormat::S32le,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameFormat::S16le => "s16le",
            FrameFormat::S24le => "s24le",
            FrameFormat::S32le => "s32le",
            FrameFormat::Float => "float",
        }
    }
}

/// Stream direction of a host PCM endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Playback,
    Capture,
}

/// Stream-format fields shared by every buffered component kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompConfig {
    pub periods_sink: u32,
    pub periods_source: u32,
    pub frame_fmt: FrameFormat,
    pub preload_count: u32,
}

const COMP_TOKENS: &[TokenEntry<CompConfig>] = &[
    TokenEntry::word(TKN_COMP_PERIOD_SINK_COUNT, |c, v| c.periods_sink = v),
    TokenEntry::word(TKN_COMP_PERIOD_SOURCE_COUNT, |c, v| c.periods_source = v),
    TokenEntry::string(TKN_COMP_FORMAT, |c, v| c.frame_fmt = FrameFormat::from_name(v)),
    TokenEntry::word(TKN_COMP_PRELOAD_COUNT, |c, v| c.preload_count = v),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferDesc {
    pub size: u32,
    pub caps: u32,
}

const BUFFER_TOKENS: &[TokenEntry<BufferDesc>] = &[
    TokenEntry::word(TKN_BUF_SIZE, |b, v| b.size = v),
    TokenEntry::word(TKN_BUF_CAPS, |b, v| b.caps = v),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixerDesc {
    pub config: CompConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeDesc {
    pub ramp: u32,
    pub initial_ramp: u32,
    pub config: CompConfig,
}

const VOLUME_TOKENS: &[TokenEntry<VolumeDesc>] = &[
    TokenEntry::word(TKN_VOLUME_RAMP_STEP_TYPE, |d, v| d.ramp = v),
    TokenEntry::word(TKN_VOLUME_RAMP_STEP_MS, |d, v| d.initial_ramp = v),
];

#[derive(Debug, Clone, PartialEq)]
pub struct HostDesc {
    pub direction: Direction,
    pub dmac_config: u32,
    pub config: CompConfig,
}

const HOST_TOKENS: &[TokenEntry<HostDesc>] =
    &[TokenEntry::word(TKN_PCM_DMAC_CONFIG, |d, v| d.dmac_config = v)];

/// Name-to-type mapping for the DAI type string token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DaiType {
    #[default]
    None,
    Ssp,
    Dmic,
    Hda,
}

impl DaiType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "SSP" => DaiType::Ssp,
            "DMIC" => DaiType::Dmic,
            "HDA" => DaiType::Hda,
            _ => DaiType::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DaiType::None => "none",
            DaiType::Ssp => "SSP",
            DaiType::Dmic => "DMIC",
            DaiType::Hda => "HDA",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DaiDesc {
    pub dai_type: DaiType,
    pub dai_index: u32,
    pub dmac_config: u32,
    pub config: CompConfig,
}

const DAI_TOKENS: &[TokenEntry<DaiDesc>] = &[
    TokenEntry::word(TKN_DAI_DMAC_CONFIG, |d, v| d.dmac_config = v),
    TokenEntry::string(TKN_DAI_TYPE, |d, v| d.dai_type = DaiType::from_name(v)),
    TokenEntry::word(TKN_DAI_INDEX, |d, v| d.dai_index = v),
];

/// Scheduling parameters of a pipeline scheduler widget.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineDesc {
    pub deadline: u32,
    pub priority: u32,
    pub mips: u32,
    pub core: u32,
    pub frames_per_sched: u32,
    pub timer: u32,
}

const SCHED_TOKENS: &[TokenEntry<PipelineDesc>] = &[
    TokenEntry::word(TKN_SCHED_DEADLINE, |d, v| d.deadline = v),
    TokenEntry::word(TKN_SCHED_PRIORITY, |d, v| d.priority = v),
    TokenEntry::word(TKN_SCHED_MIPS, |d, v| d.mips = v),
    TokenEntry::word(TKN_SCHED_CORE, |d, v| d.core = v),
    TokenEntry::word(TKN_SCHED_FRAMES, |d, v| d.frames_per_sched = v),
    TokenEntry::word(TKN_SCHED_TIMER, |d, v| d.timer = v),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SrcDesc {
    pub source_rate: u32,
    pub sink_rate: u32,
    pub config: CompConfig,
}

const SRC_TOKENS: &[TokenEntry<SrcDesc>] = &[
    TokenEntry::word(TKN_SRC_RATE_IN, |d, v| d.source_rate = v),
    TokenEntry::word(TKN_SRC_RATE_OUT, |d, v| d.sink_rate = v),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneDesc {
    pub frequency: u32,
    pub amplitude: u32,
    pub config: CompConfig,
}

// the format defines no tone tokens yet
const TONE_TOKENS: &[TokenEntry<ToneDesc>] = &[];

/// Semantic payload of one decoded widget.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Buffer(BufferDesc),
    Mixer(MixerDesc),
    Volume(VolumeDesc),
    Host(HostDesc),
    Dai(DaiDesc),
    Pipeline(PipelineDesc),
    Src(SrcDesc),
    Tone(ToneDesc),
    /// Kinds carried in the stream but without decoded parameters
    /// (input/output, mux, adc/dac, effects and codec stages).
    Passthrough,
}

impl Component {
    pub fn config(&self) -> Option<&CompConfig> {
        match self {
            Component::Mixer(d) => Some(&d.config),
            Component::Volume(d) => Some(&d.config),
            Component::Host(d) => Some(&d.config),
            Component::Dai(d) => Some(&d.config),
            Component::Src(d) => Some(&d.config),
            Component::Tone(d) => Some(&d.config),
            _ => None,
        }
    }
}

/// Decode one widget into its component descriptor.
pub fn load_component(
    widget: &RawWidget,
    pipeline_id: u32,
    component_id: u32,
) -> Result<Component, ComponentError> {
    debug!(
        widget = %widget.name,
        kind = widget.kind.as_str(),
        pipeline_id,
        component_id,
        "loading component"
    );

    let priv_data = widget.priv_data.as_slice();
    let component = match widget.kind {
        WidgetKind::Buffer => {
            let mut desc = BufferDesc::default();
            parse_tokens(&mut desc, BUFFER_TOKENS, priv_data)?;
            Component::Buffer(desc)
        }
        WidgetKind::Mixer => {
            let mut desc = MixerDesc::default();
            parse_tokens(&mut desc.config, COMP_TOKENS, priv_data)?;
            Component::Mixer(desc)
        }
        WidgetKind::Pga => {
            if widget.num_kcontrols != 1 {
                return Err(ComponentError::InvalidControlCount {
                    count: widget.num_kcontrols,
                });
            }
            let mut desc = VolumeDesc::default();
            parse_tokens(&mut desc, VOLUME_TOKENS, priv_data)?;
            parse_tokens(&mut desc.config, COMP_TOKENS, priv_data)?;
            Component::Volume(desc)
        }
        WidgetKind::AifIn | WidgetKind::AifOut => {
            let direction = if widget.kind == WidgetKind::AifIn {
                Direction::Playback
            } else {
                Direction::Capture
            };
            let mut desc = HostDesc {
                direction,
                dmac_config: 0,
                config: CompConfig::default(),
            };
            parse_tokens(&mut desc, HOST_TOKENS, priv_data)?;
            parse_tokens(&mut desc.config, COMP_TOKENS, priv_data)?;
            Component::Host(desc)
        }
        WidgetKind::DaiIn | WidgetKind::DaiOut => {
            let mut desc = DaiDesc::default();
            parse_tokens(&mut desc, DAI_TOKENS, priv_data)?;
            parse_tokens(&mut desc.config, COMP_TOKENS, priv_data)?;
            Component::Dai(desc)
        }
        WidgetKind::Scheduler => {
            let mut desc = PipelineDesc::default();
            parse_tokens(&mut desc, SCHED_TOKENS, priv_data)?;
            Component::Pipeline(desc)
        }
        WidgetKind::Src => {
            let mut desc = SrcDesc::default();
            parse_tokens(&mut desc, SRC_TOKENS, priv_data)?;
            parse_tokens(&mut desc.config, COMP_TOKENS, priv_data)?;
            Component::Src(desc)
        }
        WidgetKind::Siggen => {
            let mut desc = ToneDesc::default();
            parse_tokens(&mut desc, TONE_TOKENS, priv_data)?;
            parse_tokens(&mut desc.config, COMP_TOKENS, priv_data)?;
            Component::Tone(desc)
        }
        WidgetKind::Input
        | WidgetKind::Output
        | WidgetKind::Mux
        | WidgetKind::OutDrv
        | WidgetKind::Adc
        | WidgetKind::Dac
        | WidgetKind::Switch
        | WidgetKind::Pre
        | WidgetKind::Post
        | WidgetKind::DaiLink
        | WidgetKind::Effect
        | WidgetKind::Asrc
        | WidgetKind::Encoder
        | WidgetKind::Decoder => Component::Passthrough,
    };

    Ok(component)
}

/// Tokens understood by DAI-link records (shared with [`crate::link`]).
pub(crate) const LINK_DAI_TYPE: u32 = TKN_DAI_TYPE;
pub(crate) const LINK_DAI_INDEX: u32 = TKN_DAI_INDEX;
