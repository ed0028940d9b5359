use std::path::Path;

use rust_xlsxwriter::Workbook;

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

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const HEADERS: [&str; 6] = [
    "Student Name",
    "City",
    "Course",
    "Score",
    "Total Marks (%)",
    "CGPA",
];

/// One survey-style response with the usual mess: stray spaces, odd casing,
/// placeholder text for missing answers and the occasional blank line.
fn generate_rows(rng: &mut SimpleRng, count: usize) -> Vec<[String; 6]> {
    let first = ["Asha", "Ben", "Chen", "Divya", "Eli", "Farah", "Gus", "Hana", "Ivan", "Jia"];
    let last = ["Rao", "Smith", "Li", "Iyer", "Cohen", "Khan", "Berg", "Sato"];
    let cities = ["Pune", "pune", " Delhi ", "DELHI", "Mumbai", "Chennai "];
    let courses = ["CSE", "ECE", "Mech", "Civil"];
    let missing = ["", "N/A", "none", "  "];

    (0..count)
        .map(|i| {
            if i % 17 == 16 {
                return Default::default();
            }
            let name = format!("{} {}", rng.pick(&first), rng.pick(&last));
            let name = if i % 5 == 0 { format!("  {name} ") } else { name };

            // Scores cluster on multiples of 5 so the ranking has ties.
            let score = 40 + 5 * rng.below(13);
            let score = if rng.below(12) == 0 {
                rng.pick(&["absent", "AB", ""]).to_string()
            } else {
                score.to_string()
            };
            let marks = if rng.below(10) == 0 {
                rng.pick(&missing).to_string()
            } else {
                format!("{:.1}", 35.0 + rng.next_f64() * 65.0)
            };
            let cgpa = format!("{:.2}", 5.0 + rng.next_f64() * 5.0);

            [
                name,
                rng.pick(&cities).to_string(),
                rng.pick(&courses).to_string(),
                score,
                marks,
                cgpa,
            ]
        })
        .collect()
}

fn write_csv(path: &Path, rows: &[[String; 6]]) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Every cell goes in as text, the way form exports usually arrive.
fn write_xlsx(path: &Path, rows: &[[String; 6]]) -> Result<(), Box<dyn std::error::Error>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, header) in HEADERS.iter().enumerate() {
        sheet.write_string(0, c as u16, *header)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(r as u32 + 1, c as u16, value)?;
            }
        }
    }
    workbook.save(path)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng, 60);

    let dir = Path::new("data");
    std::fs::create_dir_all(dir)?;
    write_csv(&dir.join("responses.csv"), &rows)?;
    write_xlsx(&dir.join("responses.xlsx"), &rows)?;

    println!(
        "Wrote {} responses to data/responses.csv and data/responses.xlsx",
        rows.len()
    );
    Ok(())
}
