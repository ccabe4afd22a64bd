use metrics::counter;

pub struct Telemetry;

impl Telemetry {
    pub fn record_scan(changed: bool) {
        let outcome = if changed { "changed" } else { "unchanged" };
        counter!("scribe_scans_total", "outcome" => outcome).increment(1);
        if changed {
            counter!("scribe_changes_total").increment(1);
        }
    }

    pub fn record_draft(succeeded: bool) {
        let outcome = if succeeded { "generated" } else { "failed" };
        counter!("scribe_drafts_total", "outcome" => outcome).increment(1);
    }

    pub fn record_job(job: &str, succeeded: bool) {
        let outcome = if succeeded { "ok" } else { "error" };
        counter!("scribe_jobs_total", "job" => job.to_string(), "outcome" => outcome).increment(1);
    }
}
