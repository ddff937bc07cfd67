//! Binary record layouts and the sequential byte cursor
//!
//! A topology binary is a flat concatenation of typed records. Every record
//! starts with a fixed 36-byte header; most records then carry a fixed body
//! and a variable "private" block of vendor tuple arrays. All integers are
//! little-endian, fixed name fields are 44 bytes of NUL-padded UTF-8.

use thiserror::Error;

/// Length of every fixed name field on the wire.
pub const NAME_LEN: usize = 44;

/// Record header magic, "CoSA" in little-endian byte order.
pub const MAGIC: u32 = 0x4153_6F43;

#[derive(Error, Debug)]
pub enum WireError {
    #[error("truncated input: needed {needed} bytes, {remaining} remain")]
    TruncatedInput { needed: usize, remaining: usize },
    #[error("bad record magic 0x{0:08x}")]
    BadMagic(u32),
    #[error("unknown record kind {0}")]
    UnknownRecordKind(u32),
    #[error("unknown widget kind {0}")]
    UnknownWidgetKind(u32),
    #[error("unsupported control class {0}")]
    UnsupportedControlClass(u32),
}

/// Sequential read position over an immutable byte buffer.
///
/// The position only moves forward; every read either consumes the requested
/// bytes or fails with [`WireError::TruncatedInput`] without advancing.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Consume `len` bytes and return them as a slice.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < len {
            return Err(WireError::TruncatedInput {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn u16(&mut self) -> Result<u16, WireError> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Read a fixed 44-byte NUL-padded name field.
    pub fn name(&mut self) -> Result<String, WireError> {
        let b = self.take(NAME_LEN)?;
        Ok(decode_name(b))
    }
}

/// Decode a NUL-padded name field, dropping everything from the first NUL.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Top-level record kind tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RecordKind {
    Mixer,
    Bytes,
    Enum,
    Graph,
    Widget,
    DaiLink,
    Pcm,
    Manifest,
    CodecLink,
    BackendLink,
    Pdata,
    Dai,
}

impl RecordKind {
    pub fn from_raw(raw: u32) -> Result<Self, WireError> {
        Ok(match raw {
            1 => RecordKind::Mixer,
            2 => RecordKind::Bytes,
            3 => RecordKind::Enum,
            4 => RecordKind::Graph,
            5 => RecordKind::Widget,
            6 => RecordKind::DaiLink,
            7 => RecordKind::Pcm,
            8 => RecordKind::Manifest,
            9 => RecordKind::CodecLink,
            10 => RecordKind::BackendLink,
            11 => RecordKind::Pdata,
            12 => RecordKind::Dai,
            other => return Err(WireError::UnknownRecordKind(other)),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Mixer => "mixer",
            RecordKind::Bytes => "bytes",
            RecordKind::Enum => "enum",
            RecordKind::Graph => "graph",
            RecordKind::Widget => "widget",
            RecordKind::DaiLink => "dai-link",
            RecordKind::Pcm => "pcm",
            RecordKind::Manifest => "manifest",
            RecordKind::CodecLink => "codec-link",
            RecordKind::BackendLink => "backend-link",
            RecordKind::Pdata => "pdata",
            RecordKind::Dai => "dai",
        }
    }
}

/// One decoded top-level record header.
#[derive(Debug, Clone)]
pub struct RecordHeader {
    pub abi: u32,
    pub version: u32,
    pub kind: RecordKind,
    pub size: u32,
    pub vendor_kind: u32,
    pub payload_size: u32,
    /// Pipeline/group identifier for widget groups.
    pub index: u32,
    pub count: u32,
}

impl RecordHeader {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let magic = r.u32()?;
        if magic != MAGIC {
            return Err(WireError::BadMagic(magic));
        }
        let abi = r.u32()?;
        let version = r.u32()?;
        let kind = RecordKind::from_raw(r.u32()?)?;
        let size = r.u32()?;
        let vendor_kind = r.u32()?;
        let payload_size = r.u32()?;
        let index = r.u32()?;
        let count = r.u32()?;
        Ok(Self {
            abi,
            version,
            kind,
            size,
            vendor_kind,
            payload_size,
            index,
            count,
        })
    }
}

/// Widget kind tags inside widget-group records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Input,
    Output,
    Mux,
    Mixer,
    Pga,
    OutDrv,
    Adc,
    Dac,
    Switch,
    Pre,
    Post,
    AifIn,
    AifOut,
    DaiIn,
    DaiOut,
    DaiLink,
    Buffer,
    Scheduler,
    Effect,
    Siggen,
    Src,
    Asrc,
    Encoder,
    Decoder,
}

impl WidgetKind {
    pub fn from_raw(raw: u32) -> Result<Self, WireError> {
        Ok(match raw {
            0 => WidgetKind::Input,
            1 => WidgetKind::Output,
            2 => WidgetKind::Mux,
            3 => WidgetKind::Mixer,
            4 => WidgetKind::Pga,
            5 => WidgetKind::OutDrv,
            6 => WidgetKind::Adc,
            7 => WidgetKind::Dac,
            8 => WidgetKind::Switch,
            9 => WidgetKind::Pre,
            10 => WidgetKind::Post,
            11 => WidgetKind::AifIn,
            12 => WidgetKind::AifOut,
            13 => WidgetKind::DaiIn,
            14 => WidgetKind::DaiOut,
            15 => WidgetKind::DaiLink,
            16 => WidgetKind::Buffer,
            17 => WidgetKind::Scheduler,
            18 => WidgetKind::Effect,
            19 => WidgetKind::Siggen,
            20 => WidgetKind::Src,
            21 => WidgetKind::Asrc,
            22 => WidgetKind::Encoder,
            23 => WidgetKind::Decoder,
            other => return Err(WireError::UnknownWidgetKind(other)),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Input => "input",
            WidgetKind::Output => "output",
            WidgetKind::Mux => "mux",
            WidgetKind::Mixer => "mixer",
            WidgetKind::Pga => "pga",
            WidgetKind::OutDrv => "out-drv",
            WidgetKind::Adc => "adc",
            WidgetKind::Dac => "dac",
            WidgetKind::Switch => "switch",
            WidgetKind::Pre => "pre",
            WidgetKind::Post => "post",
            WidgetKind::AifIn => "aif-in",
            WidgetKind::AifOut => "aif-out",
            WidgetKind::DaiIn => "dai-in",
            WidgetKind::DaiOut => "dai-out",
            WidgetKind::DaiLink => "dai-link",
            WidgetKind::Buffer => "buffer",
            WidgetKind::Scheduler => "scheduler",
            WidgetKind::Effect => "effect",
            WidgetKind::Siggen => "siggen",
            WidgetKind::Src => "src",
            WidgetKind::Asrc => "asrc",
            WidgetKind::Encoder => "encoder",
            WidgetKind::Decoder => "decoder",
        }
    }

    /// Widgets whose stream name identifies a host PCM attachment point.
    pub fn is_stream_endpoint(&self) -> bool {
        matches!(self, WidgetKind::AifIn | WidgetKind::AifOut)
    }
}

/// A directed DSP connection, 132 bytes on the wire.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub sink: String,
    pub control: String,
    pub source: String,
}

impl GraphEdge {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            sink: r.name()?,
            control: r.name()?,
            source: r.name()?,
        })
    }
}

/// Mixer-class control payload attached to a widget.
#[derive(Debug, Clone)]
pub struct MixerControl {
    pub name: String,
    pub access: u32,
    pub min: u32,
    pub max: u32,
    pub platform_max: u32,
    pub invert: u32,
    pub num_channels: u32,
}

/// Control classes we can skip over; everything mixer-like shares one layout.
const MIXER_CONTROL_CLASSES: &[u32] = &[1, 2, 5, 6, 7, 64, 67];

fn parse_control(r: &mut Reader<'_>) -> Result<MixerControl, WireError> {
    let _size = r.u32()?;
    let class = r.u32()?;
    let name = r.name()?;
    let access = r.u32()?;
    if !MIXER_CONTROL_CLASSES.contains(&class) {
        return Err(WireError::UnsupportedControlClass(class));
    }
    let min = r.u32()?;
    let max = r.u32()?;
    let platform_max = r.u32()?;
    let invert = r.u32()?;
    let num_channels = r.u32()?;
    let _priv = parse_priv(r)?;
    Ok(MixerControl {
        name,
        access,
        min,
        max,
        platform_max,
        invert,
        num_channels,
    })
}

/// Read a private block: declared byte length followed by that many bytes.
pub fn parse_priv<'a>(r: &mut Reader<'a>) -> Result<&'a [u8], WireError> {
    let size = r.u32()? as usize;
    r.take(size)
}

/// A widget record straight off the wire, private block still undecoded.
#[derive(Debug, Clone)]
pub struct RawWidget {
    pub kind: WidgetKind,
    pub name: String,
    pub stream_name: String,
    pub reg: u32,
    pub shift: u32,
    pub mask: u32,
    pub subseq: u32,
    pub invert: u32,
    pub ignore_suspend: u32,
    pub event_flags: u16,
    pub event_type: u16,
    pub num_kcontrols: u32,
    pub priv_data: Vec<u8>,
    pub controls: Vec<MixerControl>,
}

impl RawWidget {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let _size = r.u32()?;
        let kind = WidgetKind::from_raw(r.u32()?)?;
        let name = r.name()?;
        let stream_name = r.name()?;
        let reg = r.u32()?;
        let shift = r.u32()?;
        let mask = r.u32()?;
        let subseq = r.u32()?;
        let invert = r.u32()?;
        let ignore_suspend = r.u32()?;
        let event_flags = r.u16()?;
        let event_type = r.u16()?;
        let num_kcontrols = r.u32()?;
        let priv_data = parse_priv(r)?.to_vec();
        let mut controls = Vec::with_capacity(num_kcontrols as usize);
        for _ in 0..num_kcontrols {
            controls.push(parse_control(r)?);
        }
        Ok(Self {
            kind,
            name,
            stream_name,
            reg,
            shift,
            mask,
            subseq,
            invert,
            ignore_suspend,
            event_flags,
            event_type,
            num_kcontrols,
            priv_data,
            controls,
        })
    }
}

/// One sub-stream of a PCM endpoint.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub name: String,
    pub format: u32,
    pub rate: u32,
    pub channels: u32,
}

/// A PCM endpoint record: a named playback/capture stream pair.
#[derive(Debug, Clone)]
pub struct Pcm {
    pub pcm_name: String,
    pub dai_name: String,
    pub pcm_id: u32,
    pub dai_id: u32,
    pub playback: u32,
    pub capture: u32,
    pub compress: u32,
    pub flag_mask: u32,
    pub flags: u32,
    pub streams: Vec<StreamInfo>,
}

impl Pcm {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let _size = r.u32()?;
        let pcm_name = r.name()?;
        let dai_name = r.name()?;
        let pcm_id = r.u32()?;
        let dai_id = r.u32()?;
        let playback = r.u32()?;
        let capture = r.u32()?;
        let compress = r.u32()?;
        let flag_mask = r.u32()?;
        let flags = r.u32()?;
        let num_streams = r.u32()?;
        let mut streams = Vec::with_capacity(num_streams as usize);
        for _ in 0..num_streams {
            streams.push(StreamInfo {
                name: r.name()?,
                format: r.u32()?,
                rate: r.u32()?,
                channels: r.u32()?,
            });
        }
        let _priv = parse_priv(r)?;
        Ok(Self {
            pcm_name,
            dai_name,
            pcm_id,
            dai_id,
            playback,
            capture,
            compress,
            flag_mask,
            flags,
            streams,
        })
    }
}

/// Declared hardware clocking and slot configuration for one DAI link.
///
/// `bclk_master`/`fsync_master` are 0 when the codec drives the clock and 1
/// when it consumes it.
#[derive(Debug, Clone, Default)]
pub struct HwConfig {
    pub id: u32,
    pub fmt: u32,
    pub clock_gated: u32,
    pub invert_bclk: u32,
    pub invert_fsync: u32,
    pub bclk_master: u32,
    pub fsync_master: u32,
    pub mclk_direction: u32,
    pub mclk_rate: u32,
    pub bclk_rate: u32,
    pub fsync_rate: u32,
    pub tdm_slots: u32,
    pub tdm_slot_width: u32,
    pub tx_slots: u32,
    pub rx_slots: u32,
    pub tx_channels: u32,
    pub rx_channels: u32,
}

impl HwConfig {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            id: r.u32()?,
            fmt: r.u32()?,
            clock_gated: r.u32()?,
            invert_bclk: r.u32()?,
            invert_fsync: r.u32()?,
            bclk_master: r.u32()?,
            fsync_master: r.u32()?,
            mclk_direction: r.u32()?,
            mclk_rate: r.u32()?,
            bclk_rate: r.u32()?,
            fsync_rate: r.u32()?,
            tdm_slots: r.u32()?,
            tdm_slot_width: r.u32()?,
            tx_slots: r.u32()?,
            rx_slots: r.u32()?,
            tx_channels: r.u32()?,
            rx_channels: r.u32()?,
        })
    }
}

/// A DAI link record off the wire, private block still undecoded.
#[derive(Debug, Clone)]
pub struct RawLink {
    pub id: u32,
    pub name: String,
    pub stream_name: String,
    pub num_streams: u32,
    pub default_hw_config_id: u32,
    pub flag_mask: u32,
    pub flags: u32,
    pub hw_configs: Vec<HwConfig>,
    pub priv_data: Vec<u8>,
}

impl RawLink {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let _size = r.u32()?;
        let id = r.u32()?;
        let name = r.name()?;
        let stream_name = r.name()?;
        let num_streams = r.u32()?;
        let num_hw_configs = r.u32()?;
        let default_hw_config_id = r.u32()?;
        let flag_mask = r.u32()?;
        let flags = r.u32()?;
        let mut hw_configs = Vec::with_capacity(num_hw_configs as usize);
        for _ in 0..num_hw_configs {
            hw_configs.push(HwConfig::parse(r)?);
        }
        let priv_data = parse_priv(r)?.to_vec();
        Ok(Self {
            id,
            name,
            stream_name,
            num_streams,
            default_hw_config_id,
            flag_mask,
            flags,
            hw_configs,
            priv_data,
        })
    }
}

/// Manifest record: declared element counts for the whole file.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub control_elems: u32,
    pub widget_elems: u32,
    pub graph_elems: u32,
    pub pcm_elems: u32,
    pub dai_link_elems: u32,
    pub dai_elems: u32,
}

impl Manifest {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let _size = r.u32()?;
        let out = Self {
            control_elems: r.u32()?,
            widget_elems: r.u32()?,
            graph_elems: r.u32()?,
            pcm_elems: r.u32()?,
            dai_link_elems: r.u32()?,
            dai_elems: r.u32()?,
        };
        let _priv = parse_priv(r)?;
        Ok(out)
    }
}

/// Standalone physical DAI record.
#[derive(Debug, Clone)]
pub struct Dai {
    pub dai_name: String,
    pub dai_id: u32,
    pub playback: u32,
    pub capture: u32,
}

impl Dai {
    pub fn parse(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let _size = r.u32()?;
        let out = Self {
            dai_name: r.name()?,
            dai_id: r.u32()?,
            playback: r.u32()?,
            capture: r.u32()?,
        };
        let _priv = parse_priv(r)?;
        Ok(out)
    }
}
