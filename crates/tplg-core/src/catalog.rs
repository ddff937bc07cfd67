//! Record catalog built from one pass over the topology binary
//!
//! The byte stream is consumed top to bottom, record by record, into
//! append-only per-kind collections (append order is decode order and later
//! stages rely on it). Widget groups assign monotonically increasing global
//! component ids and register a pipeline when the group contains a scheduler
//! widget. Structural failures abort the decode; a widget or link whose
//! tuple data fails to load is logged, counted, and kept without its
//! descriptor so validation can skip it.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::component::{load_component, Component};
use crate::link::{load_link, DaiLinkConfig};
use crate::wire::{
    Dai, GraphEdge, Manifest, MixerControl, Pcm, RawLink, RawWidget, Reader, RecordHeader,
    RecordKind, WidgetKind, WireError,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Wire(#[from] WireError),
}

/// One widget with its assigned identity and decoded descriptor.
#[derive(Debug, Clone)]
pub struct Widget {
    pub comp_id: u32,
    pub pipeline_id: u32,
    pub kind: WidgetKind,
    pub name: String,
    pub stream_name: String,
    pub num_kcontrols: u32,
    pub controls: Vec<MixerControl>,
    /// None when the widget's tuple data failed to decode.
    pub component: Option<Component>,
}

/// One hardware link record with its decoded per-type configuration.
#[derive(Debug, Clone)]
pub struct DaiLink {
    pub id: u32,
    pub name: String,
    pub stream_name: String,
    /// None when the link's tuple data failed to decode.
    pub config: Option<DaiLinkConfig>,
}

/// A registered pipeline: a widget group containing a scheduler widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    /// The group header's declared index.
    pub id: u32,
    /// The group header's declared element count.
    pub comp_count: u32,
    /// Global component id of the group's first widget.
    pub first_comp: u32,
}

impl Pipeline {
    pub fn contains(&self, comp_id: u32) -> bool {
        comp_id >= self.first_comp && comp_id < self.first_comp + self.comp_count
    }
}

/// Everything decoded from one topology binary.
#[derive(Debug, Default)]
pub struct Catalog {
    pub headers: Vec<RecordHeader>,
    pub graphs: Vec<GraphEdge>,
    pub widgets: Vec<Widget>,
    pub manifests: Vec<Manifest>,
    pub pcms: Vec<Pcm>,
    pub links: Vec<DaiLink>,
    pub dais: Vec<Dai>,
    pub pipelines: Vec<Pipeline>,
    /// Record kinds carried only as counts (mixer/bytes/enum/pdata...).
    pub passthrough: Vec<(RecordKind, u32)>,
    /// Widgets or links whose tuple data failed to decode.
    pub element_errors: usize,
}

impl Catalog {
    /// Decode a complete topology binary. The end of input is reached when
    /// the cursor consumes the whole buffer; there is no end marker.
    pub fn decode(data: &[u8]) -> Result<Self, CatalogError> {
        let mut r = Reader::new(data);
        let mut catalog = Catalog::default();
        let mut comp_counter: u32 = 0;

        while !r.is_empty() {
            let hdr = RecordHeader::parse(&mut r)?;
            debug!(
                kind = hdr.kind.as_str(),
                index = hdr.index,
                count = hdr.count,
                "record header"
            );

            match hdr.kind {
                RecordKind::Graph => {
                    for _ in 0..hdr.count {
                        let edge = GraphEdge::parse(&mut r)?;
                        debug!(sink = %edge.sink, source = %edge.source, "graph edge");
                        catalog.graphs.push(edge);
                    }
                }
                RecordKind::Widget => {
                    let first_comp = comp_counter;
                    let mut sched_found = false;
                    for _ in 0..hdr.count {
                        let raw = RawWidget::parse(&mut r)?;
                        let comp_id = comp_counter;
                        comp_counter += 1;
                        if raw.kind == WidgetKind::Scheduler {
                            sched_found = true;
                        }
                        catalog.push_widget(raw, hdr.index, comp_id);
                    }
                    // a group without a scheduler is not a pipeline
                    if sched_found {
                        catalog.pipelines.push(Pipeline {
                            id: hdr.index,
                            comp_count: hdr.count,
                            first_comp,
                        });
                    }
                }
                RecordKind::DaiLink | RecordKind::BackendLink => {
                    for _ in 0..hdr.count {
                        let raw = RawLink::parse(&mut r)?;
                        catalog.push_link(raw);
                    }
                }
                RecordKind::Pcm => {
                    for _ in 0..hdr.count {
                        let pcm = Pcm::parse(&mut r)?;
                        debug!(pcm = %pcm.pcm_name, dai_id = pcm.dai_id, "pcm endpoint");
                        catalog.pcms.push(pcm);
                    }
                }
                RecordKind::Manifest => {
                    for _ in 0..hdr.count {
                        catalog.manifests.push(Manifest::parse(&mut r)?);
                    }
                }
                RecordKind::Dai => {
                    for _ in 0..hdr.count {
                        catalog.dais.push(Dai::parse(&mut r)?);
                    }
                }
                RecordKind::Mixer
                | RecordKind::Bytes
                | RecordKind::Enum
                | RecordKind::CodecLink
                | RecordKind::Pdata => {
                    info!(
                        kind = hdr.kind.as_str(),
                        count = hdr.count,
                        "record kind not processed, counting only"
                    );
                    r.take(hdr.payload_size as usize)?;
                    catalog.passthrough.push((hdr.kind, hdr.count));
                }
            }

            catalog.headers.push(hdr);
        }

        Ok(catalog)
    }

    fn push_widget(&mut self, raw: RawWidget, pipeline_id: u32, comp_id: u32) {
        let component = match load_component(&raw, pipeline_id, comp_id) {
            Ok(c) => Some(c),
            Err(e) => {
                error!(widget = %raw.name, error = %e, "component decode failed");
                self.element_errors += 1;
                None
            }
        };
        self.widgets.push(Widget {
            comp_id,
            pipeline_id,
            kind: raw.kind,
            name: raw.name,
            stream_name: raw.stream_name,
            num_kcontrols: raw.num_kcontrols,
            controls: raw.controls,
            component,
        });
    }

    fn push_link(&mut self, raw: RawLink) {
        let config = match load_link(&raw) {
            Ok(c) => Some(c),
            Err(e) => {
                error!(link = %raw.name, error = %e, "link decode failed");
                self.element_errors += 1;
                None
            }
        };
        self.links.push(DaiLink {
            id: raw.id,
            name: raw.name,
            stream_name: raw.stream_name,
            config,
        });
    }

    /// Find the pipeline owning a global component id. Linear in the number
    /// of registered pipelines; validation runs once over a bounded catalog.
    pub fn pipeline_of(&self, comp_id: u32) -> Option<&Pipeline> {
        self.pipelines.iter().find(|p| p.contains(comp_id))
    }

    pub fn find_widget(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// Resolve a name against the stream names of host endpoint widgets.
    pub fn find_stream_widget(&self, name: &str) -> Option<&Widget> {
        self.widgets
            .iter()
            .find(|w| w.kind.is_stream_endpoint() && w.stream_name == name)
    }

    pub fn is_buffer(&self, name: &str) -> bool {
        self.widgets
            .iter()
            .any(|w| w.kind == WidgetKind::Buffer && w.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    /// Widget group of `kinds` under one header with the given index.
    fn widget_group(index: u32, kinds: &[u32]) -> Vec<u8> {
        let mut out = Vec::new();
        let widgets: Vec<Vec<u8>> = kinds
            .iter()
            .enumerate()
            .map(|(i, &k)| {
                let num_kcontrols = if k == 4 { 1 } else { 0 };
                let controls: Vec<Vec<u8>> = (0..num_kcontrols)
                    .map(|_| fixtures::mixer_control("vol"))
                    .collect();
                fixtures::widget(
                    k,
                    &format!("W{index}.{i}"),
                    "",
                    &fixtures::priv_block(&[]),
                    &controls,
                )
            })
            .collect();
        let payload: usize = widgets.iter().map(Vec::len).sum();
        out.extend(fixtures::record_header(5, index, kinds.len() as u32, payload as u32));
        for w in widgets {
            out.extend(w);
        }
        out
    }

    #[test]
    fn test_group_with_scheduler_registers_pipeline() {
        // five widgets, the third is a scheduler
        let data = widget_group(2, &[16, 3, 17, 16, 11]);
        let catalog = Catalog::decode(&data).unwrap();
        assert_eq!(catalog.widgets.len(), 5);
        assert_eq!(catalog.pipelines.len(), 1);
        let p = &catalog.pipelines[0];
        assert_eq!(p.id, 2);
        assert_eq!(p.comp_count, 5);
        assert_eq!(p.first_comp, 0);
        for comp_id in 0..5 {
            assert_eq!(catalog.pipeline_of(comp_id), Some(p));
        }
    }

    #[test]
    fn test_group_without_scheduler_is_not_a_pipeline() {
        let data = [widget_group(1, &[16, 3]), widget_group(2, &[16, 17])].concat();
        let catalog = Catalog::decode(&data).unwrap();
        assert_eq!(catalog.pipelines.len(), 1);
        assert_eq!(catalog.pipelines[0].id, 2);
        // widgets of the scheduler-less group resolve to no pipeline
        assert!(catalog.pipeline_of(0).is_none());
        assert!(catalog.pipeline_of(1).is_none());
        assert!(catalog.pipeline_of(2).is_some());
        assert!(catalog.pipeline_of(3).is_some());
    }

    #[test]
    fn test_component_ids_assigned_in_decode_order() {
        let data = [widget_group(1, &[16, 17]), widget_group(2, &[16, 17, 3])].concat();
        let catalog = Catalog::decode(&data).unwrap();
        let ids: Vec<u32> = catalog.widgets.iter().map(|w| w.comp_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(catalog.widgets[2].pipeline_id, 2);
        assert_eq!(catalog.pipelines[1].first_comp, 2);
    }

    #[test]
    fn test_graph_records() {
        let edges = [
            fixtures::graph_edge("BUF1.0", "PGA1.0"),
            fixtures::graph_edge("SSP0.OUT", "BUF1.0"),
        ]
        .concat();
        let mut data = fixtures::record_header(4, 0, 2, edges.len() as u32);
        data.extend(edges);
        let catalog = Catalog::decode(&data).unwrap();
        assert_eq!(catalog.graphs.len(), 2);
        assert_eq!(catalog.graphs[0].sink, "BUF1.0");
        assert_eq!(catalog.graphs[1].source, "BUF1.0");
    }

    #[test]
    fn test_manifest_and_dai_records() {
        let manifest = fixtures::manifest(0, 4, 2, 1, 1, 1);
        let mut data = fixtures::record_header(8, 0, 1, manifest.len() as u32);
        data.extend(&manifest);
        let dai = fixtures::dai("SSP0 Pin", 0);
        data.extend(fixtures::record_header(12, 0, 1, dai.len() as u32));
        data.extend(&dai);
        let catalog = Catalog::decode(&data).unwrap();
        assert_eq!(catalog.manifests.len(), 1);
        assert_eq!(catalog.manifests[0].widget_elems, 4);
        assert_eq!(catalog.dais.len(), 1);
        assert_eq!(catalog.dais[0].dai_name, "SSP0 Pin");
    }

    #[test]
    fn test_passthrough_kinds_counted_and_skipped() {
        let mut data = fixtures::record_header(11, 0, 3, 4);
        data.extend([0u8; 4]); // opaque pdata payload
        data.extend(fixtures::record_header(1, 0, 2, 0));
        let catalog = Catalog::decode(&data).unwrap();
        assert_eq!(
            catalog.passthrough,
            vec![(RecordKind::Pdata, 3), (RecordKind::Mixer, 2)]
        );
        assert_eq!(catalog.headers.len(), 2);
    }

    #[test]
    fn test_widget_decode_failure_is_counted_not_fatal() {
        // PGA with zero controls fails its loader but decode continues
        let data = widget_group(1, &[17, 16]);
        let mut stream = data.clone();
        let bad = fixtures::widget(4, "PGA", "", &fixtures::priv_block(&[]), &[]);
        stream.extend(fixtures::record_header(5, 3, 1, bad.len() as u32));
        stream.extend(bad);
        let catalog = Catalog::decode(&stream).unwrap();
        assert_eq!(catalog.widgets.len(), 3);
        assert_eq!(catalog.element_errors, 1);
        assert!(catalog.widgets[2].component.is_none());
    }

    #[test]
    fn test_truncated_stream_is_fatal() {
        let mut data = fixtures::record_header(4, 0, 2, 264);
        data.extend(fixtures::graph_edge("A", "B"));
        // second declared edge missing
        assert!(matches!(
            Catalog::decode(&data),
            Err(CatalogError::Wire(WireError::TruncatedInput { .. }))
        ));
    }

    #[test]
    fn test_unknown_record_kind_is_fatal() {
        let data = fixtures::record_header(42, 0, 0, 0);
        assert!(matches!(
            Catalog::decode(&data),
            Err(CatalogError::Wire(WireError::UnknownRecordKind(42)))
        ));
    }

    #[test]
    fn test_lookup_helpers() {
        let mut data = widget_group(1, &[16, 17, 11]);
        let catalog = {
            // host widget with a stream name
            let w = fixtures::widget(12, "PCM0.CAP", "Port0", &fixtures::priv_block(&[]), &[]);
            data.extend(fixtures::record_header(5, 2, 1, w.len() as u32));
            data.extend(w);
            Catalog::decode(&data).unwrap()
        };
        assert!(catalog.find_widget("W1.0").is_some());
        assert!(catalog.find_widget("missing").is_none());
        assert!(catalog.is_buffer("W1.0"));
        assert!(!catalog.is_buffer("W1.1"));
        assert_eq!(
            catalog.find_stream_widget("Port0").map(|w| w.name.as_str()),
            Some("PCM0.CAP")
        );
    }
}
