use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

/// Write a synthetic NMR dataset for trying out `nmr-summary`.
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Dataset directory to create
    #[arg(default_value = "sample_dataset")]
    output: PathBuf,

    /// Points per 1D spectrum
    #[arg(long, default_value_t = 16384)]
    points: usize,

    /// Random seed for the noise
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
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

/// One dimension's acquisition registers.
struct Dimension {
    nucleus: &'static str,
    sw_ppm: f64,
    sfo1_mhz: f64,
    o1_hz: f64,
    td: usize,
}

/// One experiment folder to write.
struct Spec {
    number: u32,
    pulse_program: &'static str,
    scans: u32,
    kelvin: f64,
    date: i64,
    direct: Dimension,
    indirect: Option<Dimension>,
    /// (ppm, width, amplitude); 1D only.
    peaks: Vec<(f64, f64, f64)>,
    absf2: f64,
}

fn acqus_text(spec: &Spec, dim: &Dimension, general: bool) -> String {
    let mut text = String::from(
        "##TITLE= Parameter file, generate_sample\n##JCAMPDX= 5.0\n##DATATYPE= Parameter Values\n",
    );
    text.push_str(&format!("##$NUC1= <{}>\n", dim.nucleus));
    text.push_str(&format!("##$SW= {}\n", dim.sw_ppm));
    text.push_str(&format!("##$SW_h= {}\n", dim.sw_ppm * dim.sfo1_mhz));
    text.push_str(&format!("##$SFO1= {}\n", dim.sfo1_mhz));
    text.push_str(&format!("##$O1= {}\n", dim.o1_hz));
    text.push_str(&format!("##$TD= {}\n", dim.td));
    if general {
        text.push_str(&format!("##$DATE= {}\n", spec.date));
        text.push_str(&format!("##$PULPROG= <{}>\n", spec.pulse_program));
        text.push_str(&format!("##$NS= {}\n", spec.scans));
        text.push_str(&format!("##$TE= {}\n", spec.kelvin));
        text.push_str("##$D= (0..7)\n0 0.1 0 0 0 0 0 0\n");
    }
    text.push_str("##END=\n");
    text
}

fn write_experiment(root: &Path, spec: &Spec, points: usize, rng: &mut SimpleRng) -> Result<()> {
    let dir = root.join(spec.number.to_string());
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("acqus"), acqus_text(spec, &spec.direct, true))?;

    if let Some(indirect) = &spec.indirect {
        fs::write(dir.join("acqu2s"), acqus_text(spec, indirect, false))?;
        fs::write(dir.join("ser"), vec![0u8; spec.direct.td * 4])?;
        return Ok(());
    }
    fs::write(dir.join("fid"), vec![0u8; spec.direct.td * 4])?;

    let pdata = dir.join("pdata/1");
    fs::create_dir_all(&pdata)?;
    fs::write(
        pdata.join("procs"),
        format!(
            "##TITLE= Parameter file, generate_sample\n##$ABSF2= {}\n##$SI= {points}\n\
             ##$BYTORDP= 0\n##$DTYPP= 0\n##$NC_proc= 0\n##END=\n",
            spec.absf2
        ),
    )?;

    let step = spec.direct.sw_ppm / points as f64;
    let samples: Vec<u8> = (0..points)
        .flat_map(|i| {
            let ppm = (points - i) as f64 * step + spec.absf2;
            let signal: f64 = spec
                .peaks
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(ppm, mu, sigma, amp))
                .sum();
            let value = signal + rng.gauss(0.0, 2_000.0);
            (value.round() as i32).to_le_bytes()
        })
        .collect();
    fs::write(pdata.join("1r"), samples)?;
    Ok(())
}

fn proton(o1_hz: f64) -> Dimension {
    Dimension {
        nucleus: "1H",
        sw_ppm: 20.0254,
        sfo1_mhz: 400.1324708,
        o1_hz,
        td: 65536,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let specs = vec![
        Spec {
            number: 1,
            pulse_program: "zg30",
            scans: 16,
            kelvin: 298.15,
            date: 1_600_000_000,
            direct: proton(2470.97),
            indirect: None,
            peaks: vec![(5.41, 0.004, 4.0e5), (4.21, 0.004, 2.5e5), (3.78, 0.01, 6.0e5), (0.0, 0.003, 3.0e5)],
            absf2: -4.84,
        },
        Spec {
            number: 2,
            pulse_program: "noesygppr1d",
            scans: 64,
            kelvin: 300.0,
            date: 1_600_003_600,
            direct: proton(1881.6),
            indirect: None,
            peaks: vec![(7.26, 0.003, 1.5e5), (2.17, 0.004, 8.0e5), (1.25, 0.006, 5.0e5)],
            absf2: -5.31,
        },
        Spec {
            number: 10,
            pulse_program: "hsqcedetgpsisp2.3",
            scans: 8,
            kelvin: 298.0,
            date: 1_600_010_000,
            direct: Dimension {
                td: 2048,
                ..proton(2470.97)
            },
            indirect: Some(Dimension {
                nucleus: "13C",
                sw_ppm: 165.0,
                sfo1_mhz: 100.6228298,
                o1_hz: 7545.0,
                td: 256,
            }),
            peaks: Vec::new(),
            absf2: 0.0,
        },
    ];

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    for spec in &specs {
        write_experiment(&args.output, spec, args.points, &mut rng)
            .with_context(|| format!("writing experiment {}", spec.number))?;
    }

    // a folder without instrument data, to be skipped
    let junk = args.output.join("999");
    fs::create_dir_all(&junk)?;
    fs::write(junk.join("notes.txt"), "acquisition aborted\n")?;

    println!(
        "Wrote {} experiments (+1 unreadable folder) to {}",
        specs.len(),
        args.output.display()
    );
    Ok(())
}
