use rust_xlsxwriter::Workbook;

/// Smooth CTE curve (1e-6/K) with a glass-transition style bump.
fn cte_curve(t: f64, rate: f64) -> f64 {
    let base = 8.0 + 0.012 * t - 4.0e-6 * t * t;
    let tg = 550.0 + 6.0 * rate;
    base + 3.0 * (-(t - tg).powi(2) / (2.0 * 40.0_f64.powi(2))).exp()
}

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

fn main() {
    let mut rng = SimpleRng::new(42);

    // (heating rate in K/min, number of readings); faster runs record fewer points.
    let runs = [(1.0, 400), (3.0, 300), (6.0, 200), (10.0, 150)];
    let spike_probability = 0.015;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Rawdata").expect("Failed to name sheet");
    sheet
        .write_string(0, 0, "Dilatometer export – CTE vs temperature")
        .expect("Failed to write directive row");

    let mut spikes = 0;
    for (block, &(rate, n)) in runs.iter().enumerate() {
        let t_col = (2 * block) as u16;
        let cte_col = t_col + 1;
        sheet.write_string(1, t_col, "T[°C]").expect("Failed to write header");
        sheet.write_string(1, cte_col, "CTE").expect("Failed to write header");

        for i in 0..n {
            let t = 25.0 + 975.0 * i as f64 / (n - 1) as f64;
            let mut cte = cte_curve(t, rate) + rng.gauss(0.0, 0.03);
            if rng.next_f64() < spike_probability {
                cte += rng.gauss(0.0, 1.0).signum() * (5.0 + 10.0 * rng.next_f64());
                spikes += 1;
            }

            let row = 2 + i as u32;
            sheet.write_number(row, t_col, t).expect("Failed to write temperature");
            sheet.write_number(row, cte_col, cte).expect("Failed to write CTE");
        }
    }

    let output_path = "sample_cte.xlsx";
    workbook.save(output_path).expect("Failed to write workbook");

    println!(
        "Wrote {} heating rates with {spikes} injected spikes to {output_path}",
        runs.len()
    );
}
