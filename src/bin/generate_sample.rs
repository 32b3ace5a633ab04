use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const COLUMNS: [&str; 8] = [
    "Filters",
    "Institutions",
    "Very favorable",
    "Somewhat favorable",
    "Somewhat unfavorable",
    "Very unfavorable",
    "Heard Of, No Opinion",
    "Never Heard Of",
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Jitter a base response profile for one demographic subgroup, then
/// renormalise so the six shares sum to one.
fn subgroup_rates(base: [f64; 6], rng: &mut SimpleRng) -> [f64; 6] {
    let mut rates = base.map(|r| (r + rng.gauss(0.0, 0.02)).max(0.005));
    let total: f64 = rates.iter().sum();
    for r in &mut rates {
        *r = (*r / total * 10_000.0).round() / 10_000.0;
    }
    rates
}

fn main() {
    let mut rng = SimpleRng::new(42);

    // Base profile per institution: very fav, somewhat fav, somewhat unfav,
    // very unfav, heard of / no opinion, never heard of.
    let institutions: Vec<(&str, [f64; 6])> = vec![
        ("The Military", [0.42, 0.30, 0.10, 0.06, 0.10, 0.02]),
        ("The Police", [0.30, 0.32, 0.15, 0.12, 0.09, 0.02]),
        ("Public Schools", [0.22, 0.38, 0.18, 0.10, 0.10, 0.02]),
        ("The Supreme Court", [0.18, 0.34, 0.20, 0.14, 0.12, 0.02]),
        ("Organized Labor", [0.16, 0.30, 0.20, 0.13, 0.16, 0.05]),
        ("Banks", [0.12, 0.36, 0.24, 0.14, 0.12, 0.02]),
        ("The Media", [0.10, 0.26, 0.24, 0.26, 0.12, 0.02]),
        ("Big Business", [0.09, 0.30, 0.27, 0.18, 0.14, 0.02]),
        ("Congress", [0.06, 0.24, 0.30, 0.26, 0.12, 0.02]),
        ("The Presidency", [0.24, 0.22, 0.14, 0.30, 0.08, 0.02]),
    ];

    let educ = [
        "High school or less",
        "Some college",
        "College graduate",
        "Postgraduate",
    ];
    let age = ["18-29", "30-44", "45-64", "65+"];
    let income = ["Under $50k", "$50k-$100k", "Over $100k"];

    // One topline row plus one row per demographic subgroup, per institution.
    let mut filter_labels: Vec<String> = vec!["All Adults".to_string()];
    filter_labels.extend(educ.iter().map(|v| format!("Educ: {v}")));
    filter_labels.extend(age.iter().map(|v| format!("Age: {v}")));
    filter_labels.extend(income.iter().map(|v| format!("Income: {v}")));

    let mut all_filters: Vec<String> = Vec::new();
    let mut all_institutions: Vec<String> = Vec::new();
    let mut all_rates: Vec<[f64; 6]> = Vec::new();

    for (institution, base) in &institutions {
        for label in &filter_labels {
            all_filters.push(label.clone());
            all_institutions.push(institution.to_string());
            all_rates.push(subgroup_rates(*base, &mut rng));
        }
    }

    std::fs::create_dir_all("data").expect("Failed to create data directory");

    // ---- CSV ----
    let csv_path = "data/SV.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV file");
    writer.write_record(COLUMNS).expect("Failed to write header");
    for ((label, institution), rates) in all_filters
        .iter()
        .zip(all_institutions.iter())
        .zip(all_rates.iter())
    {
        let mut record = vec![label.clone(), institution.clone()];
        record.extend(rates.iter().map(|r| format!("{r:.4}")));
        writer.write_record(&record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");

    // ---- Parquet ----
    let mut fields = vec![
        Field::new("Filters", DataType::Utf8, false),
        Field::new("Institutions", DataType::Utf8, false),
    ];
    for name in &COLUMNS[2..] {
        fields.push(Field::new(*name, DataType::Float64, false));
    }
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
        Arc::new(StringArray::from(
            all_filters.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
        Arc::new(StringArray::from(
            all_institutions.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        )),
    ];
    for i in 0..6 {
        arrays.push(Arc::new(Float64Array::from(
            all_rates.iter().map(|r| r[i]).collect::<Vec<_>>(),
        )));
    }

    let batch =
        RecordBatch::try_new(schema.clone(), arrays).expect("Failed to create RecordBatch");

    let parquet_path = "data/SV.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut pq_writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    pq_writer.write(&batch).expect("Failed to write batch");
    pq_writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} rows ({} institutions x {} filter groups) to {csv_path} and {parquet_path}",
        all_filters.len(),
        institutions.len(),
        filter_labels.len()
    );
}
