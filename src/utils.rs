/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

/// Percentage of `part` in `whole`, 0 when `whole` is empty
pub fn percent(part: usize, whole: usize) -> usize {
    if whole == 0 { 0 } else { 100 * part / whole }
}

pub mod timing {

    use super::group_digits;
    use std::time::Instant;
    use std::io::Write;

    /// Reports progress of the stages of a reconstruction, with timings.
    ///
    /// This is the only place where the library writes to the terminal: the
    /// core algorithms return statistics and callers hand them to a
    /// `Progress`.
    pub struct Progress {
        previous: Instant,
        verbose: bool,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now(), verbose: true } }

        /// A `Progress` which keeps time but prints nothing
        pub fn silent() -> Self { Self { previous: Instant::now(), verbose: false } }

        /// Print message, append ellipsis, flush stdout, stay on same line, start timer.
        pub fn start(&mut self, message: &str) {
            if self.verbose {
                print!("{message} ... ");
                // Failing to flush only delays the message
                let _ = std::io::stdout().flush();
            }
            self.start_timer();
        }

        // Print time elapsed since last start or done
        pub fn done(&mut self) {
            if self.verbose {
                println!("{} ms", group_digits(self.previous.elapsed().as_millis()));
            }
            self.start_timer();
        }

        // Print message followed by time elapsed since last start or done
        pub fn done_with_message(&mut self, message: &str) {
            if self.verbose {
                println!("{message}: {} ms",
                         group_digits(self.previous.elapsed().as_millis()));
            }
            self.start_timer();
        }

        /// Print an indented line which does not affect the timer
        pub fn note(&self, message: &str) {
            if self.verbose { println!("   {message}"); }
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest(/**/  n     , expected   ,
             case(       7, "7"        ),
             case(    1234, "1,234"    ),
             case( 1234567, "1,234,567"),
    )]
    fn digits_are_grouped(n: usize, expected: &str) {
        assert_eq!(group_digits(n), expected);
    }

    #[test]
    fn percentages() {
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(3, 0), 0);
    }
}
