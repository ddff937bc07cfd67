//! Verbose per-record dumps and the decode statistics block

use std::fmt::Write as _;

use tplg_core::catalog::{Catalog, DaiLink, Widget};
use tplg_core::component::Component;
use tplg_core::link::LinkVariant;
use tplg_core::wire::{GraphEdge, Manifest, Pcm};

/// Render every decoded record, in decode order per kind.
pub fn records(catalog: &Catalog) -> String {
    let mut out = String::new();
    for m in &catalog.manifests {
        out.push_str(&manifest(m));
    }
    for w in &catalog.widgets {
        out.push_str(&widget(w));
    }
    for l in &catalog.links {
        out.push_str(&link(l));
    }
    for p in &catalog.pcms {
        out.push_str(&pcm(p));
    }
    for e in &catalog.graphs {
        out.push_str(&graph_edge(e));
    }
    out
}

fn manifest(m: &Manifest) -> String {
    format!(
        "manifest: {} controls, {} widgets, {} graph edges, {} pcms, {} dai links, {} dais\n",
        m.control_elems, m.widget_elems, m.graph_elems, m.pcm_elems, m.dai_link_elems, m.dai_elems
    )
}

fn widget(w: &Widget) -> String {
    let mut out = format!(
        "widget {:?} kind {} pipeline {} comp {}\n",
        w.name,
        w.kind.as_str(),
        w.pipeline_id,
        w.comp_id
    );
    if !w.stream_name.is_empty() {
        let _ = writeln!(out, "  stream {:?}", w.stream_name);
    }
    match &w.component {
        Some(Component::Buffer(b)) => {
            let _ = writeln!(out, "  buffer size {} caps 0x{:x}", b.size, b.caps);
        }
        Some(Component::Volume(v)) => {
            let _ = writeln!(out, "  volume ramp {} initial {}", v.ramp, v.initial_ramp);
            out.push_str(&comp_config(&v.config));
        }
        Some(Component::Mixer(m)) => out.push_str(&comp_config(&m.config)),
        Some(Component::Host(h)) => {
            let _ = writeln!(out, "  host {:?} dmac 0x{:x}", h.direction, h.dmac_config);
            out.push_str(&comp_config(&h.config));
        }
        Some(Component::Dai(d)) => {
            let _ = writeln!(
                out,
                "  dai type {} index {} dmac 0x{:x}",
                d.dai_type.as_str(),
                d.dai_index,
                d.dmac_config
            );
            out.push_str(&comp_config(&d.config));
        }
        Some(Component::Pipeline(p)) => {
            let _ = writeln!(
                out,
                "  sched deadline {} priority {} mips {} core {} frames {} timer {}",
                p.deadline, p.priority, p.mips, p.core, p.frames_per_sched, p.timer
            );
        }
        Some(Component::Src(s)) => {
            let _ = writeln!(out, "  src {} -> {}", s.source_rate, s.sink_rate);
            out.push_str(&comp_config(&s.config));
        }
        Some(Component::Tone(t)) => {
            let _ = writeln!(out, "  tone freq {} amplitude {}", t.frequency, t.amplitude);
            out.push_str(&comp_config(&t.config));
        }
        Some(Component::Passthrough) => {}
        None => out.push_str("  (failed to decode)\n"),
    }
    for c in &w.controls {
        let _ = writeln!(
            out,
            "  control {:?} min {} max {} invert {} channels {}",
            c.name, c.min, c.max, c.invert, c.num_channels
        );
    }
    out
}

fn link(l: &DaiLink) -> String {
    let mut out = format!("link {:?} id {}\n", l.name, l.id);
    let Some(cfg) = &l.config else {
        out.push_str("  (failed to decode)\n");
        return out;
    };
    let _ = writeln!(
        out,
        "  type {} index {} format 0x{:x}",
        cfg.dai_type.as_str(),
        cfg.dai_index,
        cfg.format
    );
    match &cfg.variant {
        LinkVariant::Ssp(s) => {
            let _ = writeln!(
                out,
                "  ssp mclk {} bclk {} fsync {} slots {} width {} bits {}",
                s.mclk_rate,
                s.bclk_rate,
                s.fsync_rate,
                s.tdm_slots,
                s.tdm_slot_width,
                s.sample_valid_bits
            );
        }
        LinkVariant::Dmic(d) => {
            let _ = writeln!(
                out,
                "  dmic clk {}..{} duty {}..{} fifo {} Hz {} bits, {} pdm active",
                d.pdmclk_min,
                d.pdmclk_max,
                d.duty_min,
                d.duty_max,
                d.fifo_fs,
                d.fifo_bits,
                d.num_pdm_active
            );
            for p in &d.pdm {
                let _ = writeln!(
                    out,
                    "  pdm {} mic a {} b {} polarity a {} b {} edge {} skew {}",
                    p.id,
                    p.enable_mic_a,
                    p.enable_mic_b,
                    p.polarity_mic_a,
                    p.polarity_mic_b,
                    p.clk_edge,
                    p.skew
                );
            }
        }
        LinkVariant::Hda => out.push_str("  hda\n"),
    }
    out
}

fn pcm(p: &Pcm) -> String {
    let mut out = format!(
        "pcm {:?} dai {:?} pcm id {} dai id {} playback {} capture {}\n",
        p.pcm_name, p.dai_name, p.pcm_id, p.dai_id, p.playback, p.capture
    );
    for s in &p.streams {
        let _ = writeln!(
            out,
            "  stream {:?} format {} rate {} channels {}",
            s.name, s.format, s.rate, s.channels
        );
    }
    out
}

fn graph_edge(e: &GraphEdge) -> String {
    format!("edge {:?} -> {:?}\n", e.source, e.sink)
}

fn comp_config(c: &tplg_core::component::CompConfig) -> String {
    format!(
        "  config periods {}/{} format {} preload {}\n",
        c.periods_source,
        c.periods_sink,
        c.frame_fmt.as_str(),
        c.preload_count
    )
}

/// Per-kind element counts and the pipeline table.
pub fn statistics(catalog: &Catalog) -> String {
    let mut out = String::from("decoded:\n");
    let _ = writeln!(out, "  {} widgets", catalog.widgets.len());
    let _ = writeln!(out, "  {} graph edges", catalog.graphs.len());
    let _ = writeln!(out, "  {} dai links", catalog.links.len());
    let _ = writeln!(out, "  {} pcms", catalog.pcms.len());
    let _ = writeln!(out, "  {} manifests", catalog.manifests.len());
    let _ = writeln!(out, "  {} dais", catalog.dais.len());
    for (kind, count) in &catalog.passthrough {
        let _ = writeln!(out, "  {} {} elements (not processed)", count, kind.as_str());
    }
    if !catalog.pipelines.is_empty() {
        out.push_str("pipelines:\n");
        for p in &catalog.pipelines {
            let _ = writeln!(
                out,
                "  pipeline {}: {} components starting at {}",
                p.id, p.comp_count, p.first_comp
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tplg_core::catalog::Pipeline;
    use tplg_core::component::BufferDesc;
    use tplg_core::wire::WidgetKind;

    #[test]
    fn test_widget_dump() {
        let w = Widget {
            comp_id: 3,
            pipeline_id: 1,
            kind: WidgetKind::Buffer,
            name: "BUF1.0".to_string(),
            stream_name: String::new(),
            num_kcontrols: 0,
            controls: Vec::new(),
            component: Some(Component::Buffer(BufferDesc { size: 512, caps: 4 })),
        };
        let text = widget(&w);
        assert!(text.contains("\"BUF1.0\""));
        assert!(text.contains("kind buffer"));
        assert!(text.contains("size 512"));
    }

    #[test]
    fn test_statistics_lists_pipelines() {
        let mut catalog = Catalog::default();
        catalog.pipelines.push(Pipeline {
            id: 2,
            comp_count: 5,
            first_comp: 0,
        });
        let text = statistics(&catalog);
        assert!(text.contains("pipeline 2: 5 components starting at 0"));
    }
}
