use tempwatch_core::{
    BaselineComparison, BaselineVerdict, CityAnalysis, SeasonalStat, WeatherDocument,
    analysis::{ANOMALY_SIGMAS, ROLLING_WINDOW},
    bench::{AnalysisBenchmark, WeatherBenchmark},
    stats::Summary,
};

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

pub fn print_summary(city: &str, summary: Option<&Summary>) {
    println!("Descriptive statistics: {city}");
    let Some(s) = summary else {
        println!("  (no readings)");
        return;
    };

    println!("  count  {}", s.count);
    println!("  mean   {:.2}", s.mean);
    println!("  std    {}", fmt_opt(s.std));
    println!("  min    {:.2}", s.min);
    println!("  25%    {:.2}", s.p25);
    println!("  50%    {:.2}", s.median);
    println!("  75%    {:.2}", s.p75);
    println!("  max    {:.2}", s.max);
    println!();
}

pub fn print_anomalies(analysis: &CityAnalysis, limit: usize) {
    let total = analysis.series.anomaly_count();
    println!(
        "Anomalies (outside {ROLLING_WINDOW}-day rolling mean ± {ANOMALY_SIGMAS}σ): {total} of {} readings",
        analysis.series.len()
    );

    let anomalies: Vec<_> = analysis.series.anomalies().collect();
    let start = anomalies.len().saturating_sub(limit);
    for row in &anomalies[start..] {
        println!(
            "  {}  {:>7.2} °C  (rolling mean {}, std {})",
            row.timestamp,
            row.temperature,
            fmt_opt(row.rolling_mean),
            fmt_opt(row.rolling_std),
        );
    }
    println!();
}

pub fn print_seasonal(stats: &[SeasonalStat]) {
    println!("Seasonal profile");
    println!("  {:<8} {:>6} {:>8} {:>8}", "season", "count", "mean", "std");
    for stat in stats {
        println!(
            "  {:<8} {:>6} {:>8.2} {:>8}",
            stat.season.as_str(),
            stat.count,
            stat.mean,
            fmt_opt(stat.std),
        );
    }
}

pub fn print_comparison(city: &str, cmp: &BaselineComparison) {
    println!("Current temperature in {city}: {:.2} °C", cmp.temperature);
    println!("Current season: {}", cmp.season);

    match cmp.bounds() {
        Some((lower, upper)) => println!(
            "Historical norm: {:.2} ± {:.2} °C ({lower:.2} .. {upper:.2})",
            cmp.mean,
            upper - cmp.mean,
        ),
        None => println!("Historical norm: {:.2} °C (spread unknown)", cmp.mean),
    }

    match cmp.verdict {
        BaselineVerdict::WithinNorm => println!("The current temperature is within the norm."),
        BaselineVerdict::Anomalous => {
            println!("Anomaly! The current temperature is outside the historical norm.")
        }
        BaselineVerdict::Undetermined => {
            println!("Not enough seasonal history to judge the current temperature.")
        }
    }
    println!();
}

pub fn print_document(doc: &WeatherDocument) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(doc.as_json())?);
    Ok(())
}

pub fn print_analysis_bench(bench: &AnalysisBenchmark) {
    println!("Data processing ({} cities, {} workers)", bench.cities, bench.workers);
    println!("  {:<11} {:.4} s", bench.sequential.label, bench.sequential.elapsed.as_secs_f64());
    println!("  {:<11} {:.4} s", bench.parallel.label, bench.parallel.elapsed.as_secs_f64());
    if !bench.identical {
        println!("  warning: sequential and parallel results differ");
    }
    println!();
}

pub fn print_weather_bench(bench: &WeatherBenchmark) {
    println!("API requests ({} cities)", bench.cities);
    println!("  {:<11} {:.4} s", bench.serial.label, bench.serial.elapsed.as_secs_f64());
    println!("  {:<11} {:.4} s", bench.concurrent.label, bench.concurrent.elapsed.as_secs_f64());
    if bench.failures > 0 {
        println!("  {} request(s) failed", bench.failures);
    }
}
