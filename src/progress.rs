use std::time::Instant;
use std::io::{self, Write};

/// Contador de filas con reporte periódico de velocidad en stdout
pub struct ProgressTracker {
    start_time: Instant,
    total_processed: u64,
    report_interval: u64,
}

impl ProgressTracker {
    pub fn new(report_interval: u64) -> Self {
        Self {
            start_time: Instant::now(),
            total_processed: 0,
            report_interval: report_interval.max(1),
        }
    }

    /// Asigna el total acumulado (no suma)
    pub fn update(&mut self, processed: u64) {
        self.total_processed = processed;

        if self.total_processed % self.report_interval == 0 {
            self.report();
        }
    }

    fn rate(&self) -> (f64, f64) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            self.total_processed as f64 / elapsed
        } else {
            0.0
        };
        (elapsed, rate)
    }

    fn report(&self) {
        let (elapsed, rate) = self.rate();
        print!("\r📊 Rows written: {} | Rate: {:.0} rows/s | Time: {:.1}s",
               self.total_processed,
               rate,
               elapsed);
        io::stdout().flush().ok();
    }

    pub fn finish(&self) {
        let (elapsed, rate) = self.rate();
        println!("\r✅ Complete: {} rows in {:.1}s ({:.0} rows/s)",
                 self.total_processed,
                 elapsed,
                 rate);
    }
}
