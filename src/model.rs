//! Data structures describing the content of the infographic report.
//!
//! The types in this module form a serialization-friendly model of the report
//! input and of the values derived from it (table rows, KPI figures).  They
//! intentionally avoid referencing the rendering crate so they can be produced
//! by frontends, exchanged over the network, and inspected in tests without
//! touching `genpdf`.

use serde::{Deserialize, Serialize};

/// Number of complaints recorded for a single status label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    status: String,
    count: u64,
}

impl StatusCount {
    /// Creates a new entry for `status` with the given count.
    pub fn new(status: impl Into<String>, count: u64) -> Self {
        Self {
            status: status.into(),
            count,
        }
    }

    /// Returns the status label exactly as received.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the number of complaints with this status.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Input of a single report render.
///
/// The field names on the wire follow the camelCase shape used by the
/// frontend (`totalDenuncias`, `denunciasPorStatus`, ...).  The status
/// sequence drives both the detail table and the pie chart; the remaining
/// counters are informational and only surface through KPI cards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportInput {
    total_denuncias: u64,
    denuncias_pendentes: u64,
    denuncias_validadas: u64,
    total_pontos_coleta: u64,
    denuncias_por_status: Vec<StatusCount>,
}

impl ReportInput {
    /// Creates an input with the given complaint total and no status entries.
    pub fn new(total_denuncias: u64) -> Self {
        Self {
            total_denuncias,
            ..Self::default()
        }
    }

    /// Returns the total number of complaints.
    pub fn total_denuncias(&self) -> u64 {
        self.total_denuncias
    }

    /// Returns the number of pending complaints.
    pub fn denuncias_pendentes(&self) -> u64 {
        self.denuncias_pendentes
    }

    /// Returns the number of validated complaints.
    pub fn denuncias_validadas(&self) -> u64 {
        self.denuncias_validadas
    }

    /// Returns the number of collection points.
    pub fn total_pontos_coleta(&self) -> u64 {
        self.total_pontos_coleta
    }

    /// Returns the per-status counts in input order.
    pub fn denuncias_por_status(&self) -> &[StatusCount] {
        &self.denuncias_por_status
    }

    /// Sets the pending complaint counter and returns the updated input.
    pub fn with_pendentes(mut self, pendentes: u64) -> Self {
        self.denuncias_pendentes = pendentes;
        self
    }

    /// Sets the validated complaint counter and returns the updated input.
    pub fn with_validadas(mut self, validadas: u64) -> Self {
        self.denuncias_validadas = validadas;
        self
    }

    /// Sets the collection point counter and returns the updated input.
    pub fn with_pontos_coleta(mut self, pontos: u64) -> Self {
        self.total_pontos_coleta = pontos;
        self
    }

    /// Appends a status entry and returns the updated input.
    pub fn with_status(mut self, status: impl Into<String>, count: u64) -> Self {
        self.denuncias_por_status.push(StatusCount::new(status, count));
        self
    }

    /// Extends the status sequence and returns the updated input.
    pub fn with_statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = StatusCount>,
    {
        self.denuncias_por_status.extend(statuses);
        self
    }

    /// The data set used by the standalone invocation mode and the demos.
    pub fn sample() -> Self {
        Self::new(150)
            .with_pendentes(30)
            .with_validadas(100)
            .with_pontos_coleta(45)
            .with_status("VALIDADA", 100)
            .with_status("PENDENTE", 30)
            .with_status("REJEITADA", 20)
    }
}

/// Denominator used for table percentages.
///
/// Percentages are relative to the declared complaint total, not to the sum of
/// the listed counts.  A zero total is replaced by one.
pub fn percentage_denominator(total_denuncias: u64) -> u64 {
    total_denuncias.max(1)
}

/// Formats `count / denominator` as a percentage with one decimal place.
pub fn format_percentage(count: u64, denominator: u64) -> String {
    let denominator = denominator.max(1);
    format!("{:.1}%", (count as f64 / denominator as f64) * 100.0)
}

/// A single data row of the status detail table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRow {
    status: String,
    quantity: String,
    percentage: String,
}

impl StatusRow {
    /// Returns the status label column.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the formatted quantity column.
    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    /// Returns the formatted percentage column.
    pub fn percentage(&self) -> &str {
        &self.percentage
    }

    /// Returns the three cells in column order.
    pub fn cells(&self) -> [&str; 3] {
        [&self.status, &self.quantity, &self.percentage]
    }
}

/// Textual content of the "Denúncias por Status" table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusTable {
    rows: Vec<StatusRow>,
}

impl StatusTable {
    /// Header cells in column order.
    pub const HEADER: [&'static str; 3] = ["Status", "Quantidade", "Percentual"];

    /// Builds the table rows from the report input, one per status entry.
    pub fn from_input(input: &ReportInput) -> Self {
        let denominator = percentage_denominator(input.total_denuncias());
        let rows = input
            .denuncias_por_status()
            .iter()
            .map(|entry| StatusRow {
                status: entry.status().to_owned(),
                quantity: entry.count().to_string(),
                percentage: format_percentage(entry.count(), denominator),
            })
            .collect();
        Self { rows }
    }

    /// Returns the data rows (the header is not included).
    pub fn rows(&self) -> &[StatusRow] {
        &self.rows
    }

    /// Whether the data row at `index` (zero-based) carries the highlight background.
    ///
    /// Every second data row is highlighted, starting with the second one.
    pub fn is_highlighted(index: usize) -> bool {
        (index + 1) % 2 == 0
    }
}

/// A labelled metric shown on a KPI card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KpiFigure {
    title: &'static str,
    value: String,
}

impl KpiFigure {
    /// Creates a new KPI figure.
    pub fn new(title: &'static str, value: impl Into<String>) -> Self {
        Self {
            title,
            value: value.into(),
        }
    }

    /// Returns the card title.
    pub fn title(&self) -> &str {
        self.title
    }

    /// Returns the formatted value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Returns the KPI figures for the informational counters of `input`.
pub fn kpi_figures(input: &ReportInput) -> Vec<KpiFigure> {
    vec![
        KpiFigure::new("Total de Denúncias", input.total_denuncias().to_string()),
        KpiFigure::new("Pendentes", input.denuncias_pendentes().to_string()),
        KpiFigure::new("Validadas", input.denuncias_validadas().to_string()),
        KpiFigure::new("Pontos de Coleta", input.total_pontos_coleta().to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_percentages_use_declared_total() {
        let table = StatusTable::from_input(&ReportInput::sample());
        let percentages: Vec<_> = table.rows().iter().map(StatusRow::percentage).collect();
        assert_eq!(percentages, ["66.7%", "20.0%", "13.3%"]);
    }

    #[test]
    fn zero_total_does_not_divide_by_zero() {
        let input = ReportInput::new(0)
            .with_status("VALIDADA", 0)
            .with_status("PENDENTE", 0);
        let table = StatusTable::from_input(&input);
        assert!(table.rows().iter().all(|row| row.percentage() == "0.0%"));
    }

    #[test]
    fn zero_total_with_counts_uses_denominator_one() {
        let input = ReportInput::new(0).with_status("PENDENTE", 3);
        let table = StatusTable::from_input(&input);
        assert_eq!(table.rows()[0].percentage(), "300.0%");
    }

    #[test]
    fn listed_counts_may_diverge_from_total() {
        let input = ReportInput::new(200).with_status("VALIDADA", 50);
        let table = StatusTable::from_input(&input);
        assert_eq!(table.rows()[0].cells(), ["VALIDADA", "50", "25.0%"]);
    }

    #[test]
    fn highlight_alternates_from_second_row() {
        let highlighted: Vec<_> = (0..5).map(StatusTable::is_highlighted).collect();
        assert_eq!(highlighted, [false, true, false, true, false]);
    }

    #[test]
    fn deserializes_camel_case_fields() {
        let json = r#"{
            "totalDenuncias": 10,
            "denunciasPendentes": 4,
            "denunciasValidadas": 5,
            "totalPontosColeta": 2,
            "denunciasPorStatus": [{"status": "PENDENTE", "count": 4}]
        }"#;
        let input: ReportInput = serde_json::from_str(json).expect("valid input");
        assert_eq!(input.total_denuncias(), 10);
        assert_eq!(input.total_pontos_coleta(), 2);
        assert_eq!(input.denuncias_por_status()[0], StatusCount::new("PENDENTE", 4));
    }

    #[test]
    fn kpi_figures_follow_informational_counters() {
        let figures = kpi_figures(&ReportInput::sample());
        let values: Vec<_> = figures.iter().map(KpiFigure::value).collect();
        assert_eq!(values, ["150", "30", "100", "45"]);
    }
}
