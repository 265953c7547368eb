use std::fmt;

use serde::Serialize;

use crate::{
    facts::RawHardwareFacts,
    normalize::{ProcessorNormalizer, SubstringProcessorNormalizer},
    rules::{self, Dimension, Requirements, Verdict},
};

/// Ordered verdicts of one run plus the overall outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompatibilityReport {
    pub verdicts: Vec<Verdict>,
    pub overall: bool,
}

pub fn build_report(facts: &RawHardwareFacts, req: &Requirements) -> CompatibilityReport {
    build_report_with(facts, &SubstringProcessorNormalizer, req)
}

/// Verdict order: OS version, processors, RAM, drives, disk types, free
/// space, video cards, Wi-Fi, BLE.
pub fn build_report_with(
    facts: &RawHardwareFacts,
    normalizer: &impl ProcessorNormalizer,
    req: &Requirements,
) -> CompatibilityReport {
    let mut verdicts = vec![rules::evaluate_os_version(
        &facts.os_caption,
        &facts.os_version,
        req,
    )];

    verdicts.extend(rules::evaluate_cpu_listing(&facts.cpus));
    verdicts.push(rules::evaluate_processor(
        facts.processor_name(),
        normalizer,
        req,
    ));
    verdicts.push(rules::evaluate_ram(facts.total_ram_bytes, req));

    verdicts.extend(rules::evaluate_drive_listing(&facts.drives));
    verdicts.push(rules::evaluate_storage_size(&facts.drives, req));
    verdicts.extend(rules::evaluate_disk_media(&facts.disk_media));
    verdicts.push(rules::evaluate_free_space(facts.total_free_space_bytes, req));

    verdicts.extend(facts.gpus.iter().map(|gpu| rules::evaluate_gpu(gpu, req)));

    verdicts.push(rules::evaluate_wireless(facts.wireless_supported));
    verdicts.push(rules::evaluate_ble(facts.ble_supported));

    let overall = verdicts
        .iter()
        .filter(|v| v.dimension.is_blocking())
        .all(Verdict::pass);

    CompatibilityReport { verdicts, overall }
}

fn section(dimension: Dimension) -> Option<&'static str> {
    match dimension {
        Dimension::Cpu | Dimension::Processor => Some("Processors:"),
        Dimension::Ram => Some("Memory:"),
        Dimension::Drive | Dimension::Storage | Dimension::DiskType | Dimension::FreeSpace => {
            Some("Drives:")
        }
        Dimension::Gpu => Some("Video Cards:"),
        Dimension::OsVersion | Dimension::Wireless | Dimension::Ble => None,
    }
}

fn label(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::OsVersion => "operating system",
        Dimension::Processor => "processor",
        Dimension::Ram => "memory",
        _ => "other",
    }
}

impl CompatibilityReport {
    /// Blocking verdicts that did not pass, in report order.
    pub fn failures(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts
            .iter()
            .filter(|v| v.dimension.is_blocking() && !v.pass())
    }

    pub fn summary(&self) -> String {
        if self.overall {
            "Overall: This PC meets the minimum requirements.".to_owned()
        } else {
            let failed = self
                .failures()
                .map(|v| label(v.dimension))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Overall: This PC does not meet the minimum requirements ({}).",
                failed
            )
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = None;

        for verdict in &self.verdicts {
            let next = section(verdict.dimension);
            if let Some(header) = next {
                if next != current {
                    lines.push(header.to_owned());
                }
            }
            current = next;

            lines.extend(verdict.detail.lines().map(str::to_owned));
            lines.push(String::new());
        }

        lines.push(self.summary());
        lines
    }
}

impl fmt::Display for CompatibilityReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
