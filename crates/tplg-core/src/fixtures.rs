//! Test-only builders for wire-format byte buffers.
//!
//! Every builder mirrors one record layout in [`crate::wire`] so tests can
//! assemble topology binaries without hand-counting offsets.

use crate::wire::{MAGIC, NAME_LEN};

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend(v.to_le_bytes());
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend(v.to_le_bytes());
}

/// NUL-padded 44-byte name field.
fn push_name(out: &mut Vec<u8>, name: &str) {
    let bytes = name.as_bytes();
    assert!(bytes.len() < NAME_LEN, "fixture name too long: {name}");
    out.extend(bytes);
    out.extend(std::iter::repeat(0u8).take(NAME_LEN - bytes.len()));
}

/// 36-byte record header with the given raw kind tag.
pub fn record_header(kind: u32, index: u32, count: u32, payload_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    push_u32(&mut out, MAGIC);
    push_u32(&mut out, 3); // abi
    push_u32(&mut out, 0); // version
    push_u32(&mut out, kind);
    push_u32(&mut out, 36);
    push_u32(&mut out, 0); // vendor kind
    push_u32(&mut out, payload_size);
    push_u32(&mut out, index);
    push_u32(&mut out, count);
    out
}

/// Size-prefixed private block holding the given tuple arrays.
pub fn priv_block(arrays: &[Vec<u8>]) -> Vec<u8> {
    let total: usize = arrays.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(4 + total);
    push_u32(&mut out, total as u32);
    for a in arrays {
        out.extend(a);
    }
    out
}

fn vendor_array(kind: u32, elems: &[Vec<u8>]) -> Vec<u8> {
    let body: usize = elems.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(12 + body);
    push_u32(&mut out, (12 + body) as u32);
    push_u32(&mut out, kind);
    push_u32(&mut out, elems.len() as u32);
    for e in elems {
        out.extend(e);
    }
    out
}

/// Word tuple array of `(token, value)` pairs.
pub fn vendor_words(pairs: &[(u32, u32)]) -> Vec<u8> {
    let elems: Vec<Vec<u8>> = pairs
        .iter()
        .map(|&(token, value)| {
            let mut e = Vec::with_capacity(8);
            push_u32(&mut e, token);
            push_u32(&mut e, value);
            e
        })
        .collect();
    vendor_array(4, &elems)
}

/// Short tuple array; values still travel as 32-bit elems on the wire.
pub fn vendor_shorts(pairs: &[(u32, u16)]) -> Vec<u8> {
    let elems: Vec<Vec<u8>> = pairs
        .iter()
        .map(|&(token, value)| {
            let mut e = Vec::with_capacity(8);
            push_u32(&mut e, token);
            push_u32(&mut e, value as u32);
            e
        })
        .collect();
    vendor_array(5, &elems)
}

/// String tuple array of 48-byte elems.
pub fn vendor_strings(pairs: &[(u32, &str)]) -> Vec<u8> {
    let elems: Vec<Vec<u8>> = pairs
        .iter()
        .map(|&(token, value)| {
            let mut e = Vec::with_capacity(4 + NAME_LEN);
            push_u32(&mut e, token);
            push_name(&mut e, value);
            e
        })
        .collect();
    vendor_array(1, &elems)
}

/// Widget record: 128-byte fixed part, the given size-prefixed private
/// block, then the given control payloads.
pub fn widget(
    kind: u32,
    name: &str,
    stream_name: &str,
    priv_data: &[u8],
    controls: &[Vec<u8>],
) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 128);
    push_u32(&mut out, kind);
    push_name(&mut out, name);
    push_name(&mut out, stream_name);
    push_u32(&mut out, 0); // reg
    push_u32(&mut out, 0); // shift
    push_u32(&mut out, 0); // mask
    push_u32(&mut out, 0); // subseq
    push_u32(&mut out, 0); // invert
    push_u32(&mut out, 0); // ignore_suspend
    push_u16(&mut out, 0); // event_flags
    push_u16(&mut out, 0); // event_type
    push_u32(&mut out, controls.len() as u32);
    out.extend(priv_data);
    for c in controls {
        out.extend(c);
    }
    out
}

/// Mixer-class (class 1) control payload with an empty private block.
pub fn mixer_control(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(80);
    push_u32(&mut out, 80);
    push_u32(&mut out, 1); // control class
    push_name(&mut out, name);
    push_u32(&mut out, 0); // access
    push_u32(&mut out, 0); // min
    push_u32(&mut out, 40); // max
    push_u32(&mut out, 40); // platform_max
    push_u32(&mut out, 0); // invert
    push_u32(&mut out, 2); // num_channels
    push_u32(&mut out, 0); // empty priv
    out
}

/// PCM endpoint record with one 48 kHz stereo stream and no private data.
pub fn pcm(
    pcm_name: &str,
    dai_name: &str,
    pcm_id: u32,
    dai_id: u32,
    playback: u32,
    capture: u32,
) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 124);
    push_name(&mut out, pcm_name);
    push_name(&mut out, dai_name);
    push_u32(&mut out, pcm_id);
    push_u32(&mut out, dai_id);
    push_u32(&mut out, playback);
    push_u32(&mut out, capture);
    push_u32(&mut out, 0); // compress
    push_u32(&mut out, 0); // flag_mask
    push_u32(&mut out, 0); // flags
    push_u32(&mut out, 1); // num_streams
    push_name(&mut out, pcm_name);
    push_u32(&mut out, 0); // format
    push_u32(&mut out, 48_000);
    push_u32(&mut out, 2);
    push_u32(&mut out, 0); // empty priv
    out
}

/// 132-byte graph edge with no control name.
pub fn graph_edge(sink: &str, source: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(3 * NAME_LEN);
    push_name(&mut out, sink);
    push_name(&mut out, "");
    push_name(&mut out, source);
    out
}

/// Manifest record with the six declared element counts.
pub fn manifest(
    control_elems: u32,
    widget_elems: u32,
    graph_elems: u32,
    pcm_elems: u32,
    dai_link_elems: u32,
    dai_elems: u32,
) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 32);
    push_u32(&mut out, control_elems);
    push_u32(&mut out, widget_elems);
    push_u32(&mut out, graph_elems);
    push_u32(&mut out, pcm_elems);
    push_u32(&mut out, dai_link_elems);
    push_u32(&mut out, dai_elems);
    push_u32(&mut out, 0); // empty priv
    out
}

/// Standalone physical DAI record.
pub fn dai(name: &str, dai_id: u32) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 64);
    push_name(&mut out, name);
    push_u32(&mut out, dai_id);
    push_u32(&mut out, 1); // playback
    push_u32(&mut out, 1); // capture
    push_u32(&mut out, 0); // empty priv
    out
}

/// Hardware clock/slot configuration in wire field order.
#[derive(Debug, Clone, Default)]
pub struct HwConfigFix {
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

impl HwConfigFix {
    fn emit(&self, out: &mut Vec<u8>) {
        for v in [
            self.id,
            self.fmt,
            self.clock_gated,
            self.invert_bclk,
            self.invert_fsync,
            self.bclk_master,
            self.fsync_master,
            self.mclk_direction,
            self.mclk_rate,
            self.bclk_rate,
            self.fsync_rate,
            self.tdm_slots,
            self.tdm_slot_width,
            self.tx_slots,
            self.rx_slots,
            self.tx_channels,
            self.rx_channels,
        ] {
            push_u32(out, v);
        }
    }
}

/// DAI link record with the given hardware configs and size-prefixed
/// private block.
pub fn link(id: u32, name: &str, hw_configs: &[HwConfigFix], priv_data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    push_u32(&mut out, 116);
    push_u32(&mut out, id);
    push_name(&mut out, name);
    push_name(&mut out, ""); // stream name
    push_u32(&mut out, 0); // num_streams
    push_u32(&mut out, hw_configs.len() as u32);
    push_u32(&mut out, 0); // default_hw_config_id
    push_u32(&mut out, 0); // flag_mask
    push_u32(&mut out, 0); // flags
    for hw in hw_configs {
        hw.emit(&mut out);
    }
    out.extend(priv_data);
    out
}
