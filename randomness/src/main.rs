use statrs::statistics::{Data, Distribution};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vprng::sac::{Sac, SacReport, WEYL_SAMPLE_STEP, par_accumulate_weyl};
use vprng::{Avalanche, Cvprng, MIX64_TABLE, SXM32_TABLE, Scalar, StreamAllocator, mixer_lane};

const N: usize = 1_000_000;
const SAC_SAMPLES: u64 = 1 << 16;
const SAC_SHARDS: usize = 64;

// acceptance bar for a table entry, in percent
const MAX_MEAN_BIAS: f64 = 1.0;

fn vet(name: &str, report: SacReport) -> bool {
    let ok = report.mean_bias < MAX_MEAN_BIAS;

    if ok {
        info!(candidate = name, "{report}");
    } else {
        warn!(candidate = name, "{report}");
    }

    ok
}

fn sac_tables() -> usize {
    let mut rejected = 0;

    let avalanche = Avalanche::new();
    info!(isa = avalanche.isa().name(), "avalanche kernel");

    for lane in 0..4 {
        let sac = par_accumulate_weyl(mixer_lane(&avalanche, lane), 0, WEYL_SAMPLE_STEP, SAC_SAMPLES, SAC_SHARDS);

        if let Some(r) = sac.score() {
            rejected += usize::from(!vet(&format!("avalanche[{lane}]"), r));
        }
    }

    for m in &MIX64_TABLE {
        let sac = par_accumulate_weyl(|x| m.mix_u64(x), 0, WEYL_SAMPLE_STEP, SAC_SAMPLES, SAC_SHARDS);

        if let Some(r) = sac.score() {
            rejected += usize::from(!vet(m.name, r));
        }
    }

    for (k, m) in SXM32_TABLE.iter().enumerate() {
        // the 32-bit search drives samples with a byte-splat Weyl step
        let mut sac = Sac::<u32>::new();
        sac.accumulate_weyl(|x| m.mix_u32(x), 0, 0x0101_0101, SAC_SAMPLES);

        if let Some(r) = sac.score() {
            rejected += usize::from(!vet(&format!("sxm32[{k}]"), r));
        }
    }

    rejected
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let rejected = sac_tables();

    let total = N as f64;
    let mut rng = Scalar::new(Cvprng::with_streams(&StreamAllocator::new(0x1234)));

    let mut samples = Vec::with_capacity(N);
    let mut hist = [0usize; 256];

    for _ in 0..N {
        samples.push(rng.next_f64());
    }

    for &v in &samples {
        let idx = (v * 256.0) as usize;
        hist[idx] += 1;
    }

    let data = Data::new(samples);
    let mean = data.mean().unwrap_or(f64::NAN);
    let var = data.variance().unwrap_or(f64::NAN);

    let entropy: f64 = hist
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum();

    println!("Stats:");
    println!("  mean     : {:.6}", mean);
    println!("  variance : {:.6}", var);
    println!("  entropy  : {:.3} bits", entropy);
    println!("  rejected : {} table entries", rejected);
    println!();
    println!("(expected ~mean=0.5, var=0.0833, entropy~8 bits, rejected=0)");
}
