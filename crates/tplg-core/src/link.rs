//! Hardware DAI link decoding
//!
//! A link record carries exactly one hardware configuration plus tuple data
//! naming the DAI type. Decoding stamps the common header, derives the
//! clock-role and polarity format bits from the hardware config, then runs
//! the variant loader for the named type. SSP copies its clocking verbatim
//! from the hardware config; DMIC decodes a variable number of per-PDM
//! controller configs through the indexed tuple mode; HDA has no bespoke
//! tokens in the current table.

use thiserror::Error;
use tracing::debug;

use crate::component::{DaiType, LINK_DAI_INDEX, LINK_DAI_TYPE};
use crate::tokens::{parse_tokens, TokenEntry, TokenError};
use crate::wire::{HwConfig, RawLink};

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("link declares {0} hardware configs, exactly 1 is supported")]
    MultipleHwConfigs(u32),
    #[error("link carries no tuple data, DAI type token is required")]
    MissingTokens,
    #[error("unsupported DAI type {}", .0.as_str())]
    UnsupportedDaiType(DaiType),
    #[error(transparent)]
    Token(#[from] TokenError),
}

// Clock-role bits: codec bclk/fsync master (M) or slave (S).
pub const FMT_CBM_CFM: u32 = 1 << 12;
pub const FMT_CBS_CFM: u32 = 2 << 12;
pub const FMT_CBM_CFS: u32 = 3 << 12;
pub const FMT_CBS_CFS: u32 = 4 << 12;

// Polarity bits: normal (N) or inverted (I) bclk/fsync.
pub const FMT_NB_NF: u32 = 1 << 8;
pub const FMT_NB_IF: u32 = 2 << 8;
pub const FMT_IB_NF: u32 = 3 << 8;
pub const FMT_IB_IF: u32 = 4 << 8;

// SSP tokens, 500 range.
const TKN_SSP_MCLK_KEEP_ACTIVE: u32 = 500;
const TKN_SSP_BCLK_KEEP_ACTIVE: u32 = 501;
const TKN_SSP_FS_KEEP_ACTIVE: u32 = 502;
const TKN_SSP_MCLK_ID: u32 = 503;
const TKN_SSP_SAMPLE_BITS: u32 = 504;
const TKN_SSP_FRAME_PULSE_WIDTH: u32 = 505;
const TKN_SSP_QUIRKS: u32 = 506;

// DMIC tokens, 600 range.
const TKN_DMIC_DRIVER_VERSION: u32 = 600;
const TKN_DMIC_CLK_MIN: u32 = 601;
const TKN_DMIC_CLK_MAX: u32 = 602;
const TKN_DMIC_DUTY_MIN: u32 = 603;
const TKN_DMIC_DUTY_MAX: u32 = 604;
const TKN_DMIC_NUM_PDM_ACTIVE: u32 = 605;
const TKN_DMIC_SAMPLE_RATE: u32 = 608;
const TKN_DMIC_FIFO_WORD_LENGTH: u32 = 609;

// Per-PDM controller tokens, 700 range; ctrl id opens a new entry.
const TKN_DMIC_PDM_CTRL_ID: u32 = 700;
const TKN_DMIC_PDM_MIC_A_ENABLE: u32 = 701;
const TKN_DMIC_PDM_MIC_B_ENABLE: u32 = 702;
const TKN_DMIC_PDM_POLARITY_A: u32 = 703;
const TKN_DMIC_PDM_POLARITY_B: u32 = 704;
const TKN_DMIC_PDM_CLK_EDGE: u32 = 705;
const TKN_DMIC_PDM_SKEW: u32 = 706;

/// Serial port (SSP) link parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SspParams {
    pub mclk_keep_active: bool,
    pub bclk_keep_active: bool,
    pub fs_keep_active: bool,
    pub mclk_id: u16,
    pub sample_valid_bits: u32,
    pub frame_pulse_width: u16,
    pub quirks: u32,
    pub mclk_rate: u32,
    pub bclk_rate: u32,
    pub fsync_rate: u32,
    pub tdm_slots: u32,
    pub tdm_slot_width: u32,
    pub mclk_direction: u32,
    pub rx_slots: u32,
    pub tx_slots: u32,
}

const SSP_TOKENS: &[TokenEntry<SspParams>] = &[
    TokenEntry::boolean(TKN_SSP_MCLK_KEEP_ACTIVE, |s, v| s.mclk_keep_active = v),
    TokenEntry::boolean(TKN_SSP_BCLK_KEEP_ACTIVE, |s, v| s.bclk_keep_active = v),
    TokenEntry::boolean(TKN_SSP_FS_KEEP_ACTIVE, |s, v| s.fs_keep_active = v),
    TokenEntry::short(TKN_SSP_MCLK_ID, |s, v| s.mclk_id = v),
    TokenEntry::word(TKN_SSP_SAMPLE_BITS, |s, v| s.sample_valid_bits = v),
    TokenEntry::short(TKN_SSP_FRAME_PULSE_WIDTH, |s, v| s.frame_pulse_width = v),
    TokenEntry::word(TKN_SSP_QUIRKS, |s, v| s.quirks = v),
];

/// One digital-microphone PDM controller config.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PdmCtrl {
    pub id: u16,
    pub enable_mic_a: u16,
    pub enable_mic_b: u16,
    pub polarity_mic_a: u16,
    pub polarity_mic_b: u16,
    pub clk_edge: u16,
    pub skew: u16,
}

/// Digital-microphone (DMIC) link parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DmicParams {
    pub driver_version: u32,
    pub pdmclk_min: u32,
    pub pdmclk_max: u32,
    pub fifo_fs: u32,
    pub duty_min: u16,
    pub duty_max: u16,
    pub num_pdm_active: u32,
    pub fifo_bits: u16,
    /// Channel B always mirrors channel A's sample width in this format.
    pub fifo_bits_b: u16,
    pub pdm: Vec<PdmCtrl>,
}

const DMIC_TOKENS: &[TokenEntry<DmicParams>] = &[
    TokenEntry::word(TKN_DMIC_DRIVER_VERSION, |d, v| d.driver_version = v),
    TokenEntry::word(TKN_DMIC_CLK_MIN, |d, v| d.pdmclk_min = v),
    TokenEntry::word(TKN_DMIC_CLK_MAX, |d, v| d.pdmclk_max = v),
    TokenEntry::word(TKN_DMIC_SAMPLE_RATE, |d, v| d.fifo_fs = v),
    TokenEntry::short(TKN_DMIC_DUTY_MIN, |d, v| d.duty_min = v),
    TokenEntry::short(TKN_DMIC_DUTY_MAX, |d, v| d.duty_max = v),
    TokenEntry::word(TKN_DMIC_NUM_PDM_ACTIVE, |d, v| d.num_pdm_active = v),
    TokenEntry::short(TKN_DMIC_FIFO_WORD_LENGTH, |d, v| d.fifo_bits = v),
];

fn pdm_slot(d: &mut DmicParams, i: usize) -> &mut PdmCtrl {
    if d.pdm.len() <= i {
        d.pdm.resize(i + 1, PdmCtrl::default());
    }
    &mut d.pdm[i]
}

const DMIC_PDM_TOKENS: &[TokenEntry<DmicParams>] = &[
    TokenEntry::indexed_short(TKN_DMIC_PDM_CTRL_ID, true, |d, i, v| pdm_slot(d, i).id = v),
    TokenEntry::indexed_short(TKN_DMIC_PDM_MIC_A_ENABLE, false, |d, i, v| {
        pdm_slot(d, i).enable_mic_a = v
    }),
    TokenEntry::indexed_short(TKN_DMIC_PDM_MIC_B_ENABLE, false, |d, i, v| {
        pdm_slot(d, i).enable_mic_b = v
    }),
    TokenEntry::indexed_short(TKN_DMIC_PDM_POLARITY_A, false, |d, i, v| {
        pdm_slot(d, i).polarity_mic_a = v
    }),
    TokenEntry::indexed_short(TKN_DMIC_PDM_POLARITY_B, false, |d, i, v| {
        pdm_slot(d, i).polarity_mic_b = v
    }),
    TokenEntry::indexed_short(TKN_DMIC_PDM_CLK_EDGE, false, |d, i, v| {
        pdm_slot(d, i).clk_edge = v
    }),
    TokenEntry::indexed_short(TKN_DMIC_PDM_SKEW, false, |d, i, v| pdm_slot(d, i).skew = v),
];

/// Variant payload of one decoded link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkVariant {
    Ssp(SspParams),
    Dmic(DmicParams),
    Hda,
}

/// Fully decoded configuration for one hardware DAI link.
#[derive(Debug, Clone)]
pub struct DaiLinkConfig {
    pub dai_type: DaiType,
    pub dai_index: u32,
    pub format: u32,
    pub variant: LinkVariant,
}

/// Common header fields decoded from the link's tuple data.
#[derive(Default)]
struct LinkHeader {
    dai_type: DaiType,
    dai_index: u32,
}

const DAI_LINK_TOKENS: &[TokenEntry<LinkHeader>] = &[
    TokenEntry::string(LINK_DAI_TYPE, |h, v| h.dai_type = DaiType::from_name(v)),
    TokenEntry::word(LINK_DAI_INDEX, |h, v| h.dai_index = v),
];

/// Derive the combined clock-role and polarity format bits from the
/// hardware config booleans. Direct pair lookup, no arithmetic encoding.
fn dai_format_bits(hw: &HwConfig) -> u32 {
    // clock directions are named with respect to the codec
    let codec_bclk_master = hw.bclk_master == 0;
    let codec_fsync_master = hw.fsync_master == 0;
    let role = match (codec_bclk_master, codec_fsync_master) {
        (true, true) => FMT_CBM_CFM,
        (true, false) => FMT_CBM_CFS,
        (false, true) => FMT_CBS_CFM,
        (false, false) => FMT_CBS_CFS,
    };

    let polarity = match (hw.invert_bclk != 0, hw.invert_fsync != 0) {
        (true, true) => FMT_IB_IF,
        (true, false) => FMT_IB_NF,
        (false, true) => FMT_NB_IF,
        (false, false) => FMT_NB_NF,
    };

    role | polarity
}

fn load_ssp(link: &RawLink, hw: &HwConfig) -> Result<SspParams, LinkError> {
    let mut ssp = SspParams::default();
    parse_tokens(&mut ssp, SSP_TOKENS, &link.priv_data)?;

    ssp.mclk_rate = hw.mclk_rate;
    ssp.bclk_rate = hw.bclk_rate;
    ssp.fsync_rate = hw.fsync_rate;
    ssp.tdm_slots = hw.tdm_slots;
    ssp.tdm_slot_width = hw.tdm_slot_width;
    ssp.mclk_direction = hw.mclk_direction;
    ssp.rx_slots = hw.rx_slots;
    ssp.tx_slots = hw.tx_slots;

    Ok(ssp)
}

fn load_dmic(link: &RawLink) -> Result<DmicParams, LinkError> {
    let mut dmic = DmicParams::default();
    parse_tokens(&mut dmic, DMIC_TOKENS, &link.priv_data)?;

    // size the controller array from the declared active count, then let the
    // indexed pass fill it entry by entry
    dmic.pdm = vec![PdmCtrl::default(); dmic.num_pdm_active as usize];
    parse_tokens(&mut dmic, DMIC_PDM_TOKENS, &link.priv_data)?;

    dmic.fifo_bits_b = dmic.fifo_bits;

    Ok(dmic)
}

/// Decode one link record into its per-type configuration.
pub fn load_link(link: &RawLink) -> Result<DaiLinkConfig, LinkError> {
    let num_hw = link.hw_configs.len() as u32;
    if num_hw != 1 {
        return Err(LinkError::MultipleHwConfigs(num_hw));
    }
    // at minimum the DAI type token must be present
    if link.priv_data.is_empty() {
        return Err(LinkError::MissingTokens);
    }

    let mut header = LinkHeader::default();
    parse_tokens(&mut header, DAI_LINK_TOKENS, &link.priv_data)?;

    let hw = &link.hw_configs[0];
    let format = hw.fmt | dai_format_bits(hw);

    debug!(
        link = %link.name,
        dai_type = header.dai_type.as_str(),
        dai_index = header.dai_index,
        format,
        "loading link config"
    );

    let variant = match header.dai_type {
        DaiType::Ssp => LinkVariant::Ssp(load_ssp(link, hw)?),
        DaiType::Dmic => LinkVariant::Dmic(load_dmic(link)?),
        DaiType::Hda => LinkVariant::Hda,
        DaiType::None => return Err(LinkError::UnsupportedDaiType(header.dai_type)),
    };

    Ok(DaiLinkConfig {
        dai_type: header.dai_type,
        dai_index: header.dai_index,
        format,
        variant,
    })
}
