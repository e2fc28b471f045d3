use alertsmith_codec::{format_number, AlertRecord, ReplaceMode};
use alertsmith_rules::{
    carrier_id, display_label, has_alert_of_kind, matches_key, validate_set, AlertKind, CarrierKey,
    DurationStatistics, ThresholdConfig, ThresholdMethod, ThresholdParams, VARIANT_MARKER,
};
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::fs;

use super::Session;
use crate::{
    print_json, print_stdout, write_stdout, CarrierArgs, FmtArgs, JsonArgs, KindArg, MethodArg,
    SetThresholdArgs, StatsArgs, SuggestArgs, ValidateArgs,
};

#[derive(Serialize)]
struct AlertSummary<'a> {
    index: usize,
    carrier: String,
    carrier_id: String,
    #[serde(flatten)]
    alert: &'a AlertRecord,
}

impl<'a> AlertSummary<'a> {
    fn new(index: usize, alert: &'a AlertRecord) -> Self {
        Self {
            index,
            carrier: display_label(alert.name()),
            carrier_id: carrier_id(alert.name()),
            alert,
        }
    }

    fn line(&self) -> String {
        let threshold = self
            .alert
            .critical_threshold
            .map(format_number)
            .unwrap_or_else(|| "-".to_string());
        format!(
            "#{:<3} {}  [carrier={} id={} threshold={}]",
            self.index,
            self.alert.name(),
            or_dash(&self.carrier),
            or_dash(&self.carrier_id),
            threshold
        )
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

pub(crate) fn run_list(session: &Session, args: JsonArgs) -> Result<()> {
    let (_, path, _, alerts) = session.load_alerts()?;
    let summaries: Vec<AlertSummary<'_>> = alerts
        .iter()
        .enumerate()
        .map(|(index, alert)| AlertSummary::new(index, alert))
        .collect();

    if args.json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        log::info!("no alerts in {}", path.display());
    }
    for summary in &summaries {
        print_stdout(&summary.line())?;
    }
    Ok(())
}

pub(crate) fn run_validate(session: &Session, args: ValidateArgs) -> Result<()> {
    let (_, path, _, alerts) = session.load_alerts()?;
    let violations = validate_set(&alerts, !args.allow_duplicates);

    if args.json {
        print_json(&violations)?;
    } else {
        for violation in &violations {
            let name = alerts
                .get(violation.index)
                .map(AlertRecord::name)
                .unwrap_or_default();
            print_stdout(&format!(
                "#{} {}: {}",
                violation.index,
                or_dash(name),
                violation.error
            ))?;
        }
    }

    if violations.is_empty() {
        log::info!("{} alerts in {} are valid", alerts.len(), path.display());
        Ok(())
    } else {
        Err(anyhow!(
            "{} violation(s) in {}",
            violations.len(),
            path.display()
        ))
    }
}

#[derive(Serialize)]
struct CoverageAnswer<'a> {
    carrier: &'a str,
    kind: &'static str,
    variant: Option<bool>,
    present: bool,
}

pub(crate) fn run_carrier(session: &Session, args: CarrierArgs) -> Result<()> {
    let (_, _, _, alerts) = session.load_alerts()?;
    let key = if args.id {
        CarrierKey::Id(args.carrier.clone())
    } else {
        CarrierKey::Name(args.carrier.clone())
    };
    let variant = match (args.peak, args.regular) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    if let Some(kind) = args.kind {
        let (kind, kind_name) = match kind {
            KindArg::Duration => (AlertKind::Duration, "duration"),
            KindArg::ErrorRate => (AlertKind::ErrorRate, "error-rate"),
        };
        let present = has_alert_of_kind(&alerts, &key, kind, variant);
        if args.json {
            print_json(&CoverageAnswer {
                carrier: &args.carrier,
                kind: kind_name,
                variant,
                present,
            })?;
        } else {
            print_stdout(if present { "yes" } else { "no" })?;
        }
        if !present {
            bail!("no {kind_name} alert for carrier `{}`", args.carrier);
        }
        return Ok(());
    }

    let marker = VARIANT_MARKER.to_lowercase();
    let matching: Vec<AlertSummary<'_>> = alerts
        .iter()
        .enumerate()
        .filter(|(_, alert)| matches_key(alert, &key))
        .filter(|(_, alert)| {
            variant.map_or(true, |wanted| {
                alert.name().to_lowercase().contains(&marker) == wanted
            })
        })
        .map(|(index, alert)| AlertSummary::new(index, alert))
        .collect();

    if args.json {
        return print_json(&matching);
    }
    if matching.is_empty() {
        log::info!("no alerts for carrier `{}`", args.carrier);
    }
    for summary in &matching {
        print_stdout(&summary.line())?;
    }
    Ok(())
}

/// Configured threshold settings with command-line overrides applied.
fn effective_threshold(session: &Session, stats: &StatsArgs) -> ThresholdConfig {
    let mut cfg = session.config().threshold;
    if let Some(method) = stats.method {
        let method = match method {
            MethodArg::StdDev => ThresholdMethod::StdDev,
            MethodArg::Formula => ThresholdMethod::Formula,
        };
        if method != cfg.method {
            // parameters tuned for the other method do not carry over
            cfg = ThresholdConfig {
                method,
                params: match method {
                    ThresholdMethod::StdDev => ThresholdConfig::default().params,
                    ThresholdMethod::Formula => ThresholdParams::default(),
                },
            };
        }
    }
    if let Some(multiplier) = stats.multiplier {
        cfg.params.multiplier = Some(multiplier);
    }
    cfg
}

fn suggest_from(session: &Session, stats: &StatsArgs) -> Result<f64> {
    let cfg = effective_threshold(session, stats);
    cfg.validate()?;
    let value = cfg.suggest(DurationStatistics {
        average_duration: stats.average,
        standard_deviation: stats.std_dev,
    })?;
    Ok(value)
}

#[derive(Serialize)]
struct Suggestion {
    average_duration: f64,
    standard_deviation: f64,
    method: ThresholdMethod,
    critical_threshold: f64,
}

pub(crate) fn run_suggest(session: &Session, args: SuggestArgs) -> Result<()> {
    let value = suggest_from(session, &args.stats)?;
    if args.json {
        return print_json(&Suggestion {
            average_duration: args.stats.average,
            standard_deviation: args.stats.std_dev,
            method: effective_threshold(session, &args.stats).method,
            critical_threshold: value,
        });
    }
    print_stdout(&format_number(value))
}

pub(crate) fn run_set_threshold(session: &Session, args: SetThresholdArgs) -> Result<()> {
    let value = match (args.value, args.average, args.std_dev) {
        (Some(value), _, _) => value,
        (None, Some(average), Some(std_dev)) => suggest_from(
            session,
            &StatsArgs {
                average,
                std_dev,
                method: None,
                multiplier: None,
            },
        )?,
        _ => bail!("pass --value, or --average with --std-dev"),
    };
    if !value.is_finite() || value < 0.0 {
        bail!("threshold must be a non-negative number, got {value}");
    }

    let (codec, path, text, mut alerts) = session.load_alerts()?;
    let matches: Vec<usize> = alerts
        .iter()
        .enumerate()
        .filter(|(_, alert)| alert.name() == args.name)
        .map(|(index, _)| index)
        .collect();
    let index = match matches.as_slice() {
        [index] => *index,
        [] => bail!("no alert named `{}` in {}", args.name, path.display()),
        _ => bail!(
            "{} alerts are named `{}`; rename them before editing",
            matches.len(),
            args.name
        ),
    };

    alerts[index].critical_threshold = Some(value);
    let updated = codec
        .replace(&text, &alerts, ReplaceMode::ExistingOnly)
        .with_context(|| format!("Failed to update {}", path.display()))?;

    if args.dry_run {
        return write_stdout(&updated, false);
    }
    fs::write(&path, &updated).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!(
        "critical_threshold of `{}` set to {} in {}",
        args.name,
        format_number(value),
        path.display()
    );
    Ok(())
}

pub(crate) fn run_fmt(session: &Session, args: FmtArgs) -> Result<()> {
    let codec = session.codec()?;
    let (path, text) = session.read_document()?;
    let formatted = codec
        .canonicalize(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if formatted == text {
        log::info!("{} is already formatted", path.display());
        return Ok(());
    }
    if args.check {
        bail!("{} is not in canonical layout", path.display());
    }
    fs::write(&path, &formatted)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("formatted {}", path.display());
    Ok(())
}
