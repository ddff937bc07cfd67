//! Semantic checks over a decoded catalog
//!
//! All findings are advisory: validation always runs over the whole catalog
//! and reports per-category counts. Elements whose decode failed carry no
//! descriptor and their checks are skipped. Bounds come from [`Limits`] so a
//! platform with different hardware ceilings can override them from TOML.

use std::fmt;

use tracing::{debug, info};

use crate::catalog::{Catalog, Widget};
use crate::component::Component;
use crate::limits::{Bound, Limits};
use crate::link::LinkVariant;

/// Finding categories, used for the per-category summary counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A decoded field lies outside its configured bound.
    Range,
    /// A graph edge references a missing widget or lacks a buffer.
    Graph,
    /// Conflicting identifiers across records.
    Id,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Range => "range",
            Category::Graph => "graph",
            Category::Id => "id",
        }
    }
}

/// One advisory finding.
#[derive(Debug, Clone)]
pub struct Finding {
    pub category: Category,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category.as_str(), self.message)
    }
}

/// Collected findings of one validation run.
#[derive(Debug, Default)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    fn warn(&mut self, category: Category, message: String) {
        debug!(category = category.as_str(), %message, "finding");
        self.findings.push(Finding { category, message });
    }

    pub fn count(&self, category: Category) -> usize {
        self.findings.iter().filter(|f| f.category == category).count()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Run every check over the catalog and collect the findings.
pub fn validate(catalog: &Catalog, limits: &Limits) -> Report {
    let mut report = Report::default();
    check_ranges(catalog, limits, &mut report);
    check_graph(catalog, &mut report);
    check_ids(catalog, &mut report);
    report
}

fn check_bound(report: &mut Report, bound: &Bound, value: u32, what: String) {
    if !bound.contains(value) {
        report.warn(
            Category::Range,
            format!("{what} = {value} outside [{}, {}]", bound.min, bound.max),
        );
    }
}

fn check_ranges(catalog: &Catalog, limits: &Limits, report: &mut Report) {
    for widget in &catalog.widgets {
        match &widget.component {
            Some(Component::Buffer(b)) => {
                check_bound(
                    report,
                    &limits.buffer_size,
                    b.size,
                    format!("buffer {} size", widget.name),
                );
            }
            Some(Component::Pipeline(p)) => {
                let name = &widget.name;
                let deadline = &limits.pipeline_deadline;
                check_bound(report, deadline, p.deadline, format!("pipeline {name} deadline"));
                let priority = &limits.pipeline_priority;
                check_bound(report, priority, p.priority, format!("pipeline {name} priority"));
                check_bound(report, &limits.pipeline_mips, p.mips, format!("pipeline {name} mips"));
                check_bound(report, &limits.pipeline_core, p.core, format!("pipeline {name} core"));
                let frames = &limits.pipeline_frames;
                check_bound(report, frames, p.frames_per_sched, format!("pipeline {name} frames"));
            }
            Some(_) => {}
            None => debug!(widget = %widget.name, "skipping checks, widget failed to decode"),
        }
    }

    for link in &catalog.links {
        let Some(config) = &link.config else {
            debug!(link = %link.name, "skipping checks, link failed to decode");
            continue;
        };
        match &config.variant {
            LinkVariant::Ssp(ssp) => check_ssp(&link.name, ssp, limits, report),
            LinkVariant::Dmic(dmic) => check_dmic(&link.name, dmic, limits, report),
            LinkVariant::Hda => {}
        }
    }
}

fn check_ssp(name: &str, ssp: &crate::link::SspParams, limits: &Limits, report: &mut Report) {
    if ssp.tdm_slot_width > limits.ssp_slot_width_max {
        report.warn(
            Category::Range,
            format!(
                "link {name} tdm slot width {} exceeds {}",
                ssp.tdm_slot_width, limits.ssp_slot_width_max
            ),
        );
    }
    if ssp.bclk_rate == 0 || ssp.fsync_rate == 0 {
        report.warn(
            Category::Range,
            format!(
                "link {name} has zero clock rate (bclk {}, fsync {})",
                ssp.bclk_rate, ssp.fsync_rate
            ),
        );
        return;
    }
    // the two mclk bounds are independent; a bclk above mclk fails both
    if ssp.bclk_rate > ssp.mclk_rate {
        report.warn(
            Category::Range,
            format!("link {name} bclk {} exceeds mclk {}", ssp.bclk_rate, ssp.mclk_rate),
        );
    }
    if ssp.mclk_rate % ssp.bclk_rate != 0 {
        report.warn(
            Category::Range,
            format!("link {name} mclk {} not divisible by bclk {}", ssp.mclk_rate, ssp.bclk_rate),
        );
    }
    if ssp.bclk_rate % ssp.fsync_rate != 0 {
        report.warn(
            Category::Range,
            format!("link {name} bclk {} not divisible by fsync {}", ssp.bclk_rate, ssp.fsync_rate),
        );
    } else {
        // every frame must fit the declared slot layout
        let cycles_per_frame = ssp.bclk_rate / ssp.fsync_rate;
        let needed = ssp.tdm_slot_width * ssp.tdm_slots;
        if cycles_per_frame < needed {
            report.warn(
                Category::Range,
                format!(
                    "link {name} has {cycles_per_frame} bclk cycles per frame, \
                     {} slots of width {} need {needed}",
                    ssp.tdm_slots, ssp.tdm_slot_width
                ),
            );
        }
    }
}

fn check_dmic(name: &str, dmic: &crate::link::DmicParams, limits: &Limits, report: &mut Report) {
    if dmic.pdmclk_min > dmic.pdmclk_max {
        report.warn(
            Category::Range,
            format!("link {name} pdmclk min {} above max {}", dmic.pdmclk_min, dmic.pdmclk_max),
        );
    }
    check_bound(report, &limits.dmic_pdmclk, dmic.pdmclk_min, format!("link {name} pdmclk min"));
    check_bound(report, &limits.dmic_pdmclk, dmic.pdmclk_max, format!("link {name} pdmclk max"));
    if dmic.duty_min > dmic.duty_max {
        report.warn(
            Category::Range,
            format!("link {name} duty min {} above max {}", dmic.duty_min, dmic.duty_max),
        );
    }
    check_bound(report, &limits.dmic_duty, dmic.duty_min as u32, format!("link {name} duty min"));
    check_bound(report, &limits.dmic_duty, dmic.duty_max as u32, format!("link {name} duty max"));
    check_bound(report, &limits.dmic_fifo_rate, dmic.fifo_fs, format!("link {name} fifo rate"));
    check_bound(
        report,
        &limits.dmic_pdm_active,
        dmic.num_pdm_active,
        format!("link {name} active pdm count"),
    );
    // fifo_bits_b mirrors fifo_bits, checking it again would double-count
    check_bound(
        report,
        &limits.dmic_fifo_bits,
        dmic.fifo_bits as u32,
        format!("link {name} fifo bits"),
    );
}

/// A graph endpoint resolves through widget names first, then through the
/// stream names of host endpoints.
fn resolve<'a>(catalog: &'a Catalog, name: &str) -> Option<&'a Widget> {
    catalog
        .find_widget(name)
        .or_else(|| catalog.find_stream_widget(name))
}

fn check_graph(catalog: &Catalog, report: &mut Report) {
    for edge in &catalog.graphs {
        let sink = resolve(catalog, &edge.sink);
        let source = resolve(catalog, &edge.source);
        if sink.is_none() {
            report.warn(
                Category::Graph,
                format!("edge sink {:?} is not a known widget or stream", edge.sink),
            );
        }
        if source.is_none() {
            report.warn(
                Category::Graph,
                format!("edge source {:?} is not a known widget or stream", edge.source),
            );
        }
        if sink.is_none() || source.is_none() {
            continue;
        }
        let buffered = catalog.is_buffer(&edge.sink) || catalog.is_buffer(&edge.source);
        if !buffered {
            report.warn(
                Category::Graph,
                format!("edge {:?} -> {:?} has no buffer on either side", edge.source, edge.sink),
            );
        }
    }
}

fn check_ids(catalog: &Catalog, report: &mut Report) {
    // kernel-side matching hints, not findings
    for widget in &catalog.widgets {
        if let Some(Component::Dai(d)) = &widget.component {
            info!(
                widget = %widget.name,
                dai_index = d.dai_index,
                "DAI widget is matched to its device by index"
            );
        }
    }
    for link in &catalog.links {
        info!(link = %link.name, id = link.id, "link config is matched to its DAI by id");
    }

    // full pairwise scan; every colliding pair gets its own finding
    for (i, a) in catalog.pcms.iter().enumerate() {
        for b in &catalog.pcms[i + 1..] {
            if a.dai_id == b.dai_id {
                report.warn(
                    Category::Id,
                    format!(
                        "pcm {:?} and pcm {:?} share dai id {}",
                        a.pcm_name, b.pcm_name, a.dai_id
                    ),
                );
            }
        }
    }
}
