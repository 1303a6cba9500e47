use chrono::Utc;
use metric::Sample;
use sink::{Error, Sink};

/// Prints samples instead of storing them. Used for `--debug` runs.
#[derive(Debug, Default)]
pub struct Console {
    samples: Vec<Sample>,
    heading: String,
}

impl Console {
    /// Create a console sink that prints `heading` above every flush.
    pub fn new<S>(heading: S) -> Console
    where
        S: Into<String>,
    {
        Console {
            samples: Vec::new(),
            heading: heading.into(),
        }
    }

    /// Render the buffered samples.
    pub fn format(&self) -> String {
        let mut out = String::with_capacity(self.samples.len() * 128);
        for sample in &self.samples {
            out.push_str(&sample.to_string());
            out.push_str("\n\n");
        }
        out
    }
}

impl Sink for Console {
    fn deliver(&mut self, sample: Sample) -> () {
        self.samples.push(sample);
    }

    fn flush(&mut self) -> Result<(), Error> {
        println!("{} ({}):", self.heading, Utc::now().to_rfc3339());
        print!("{}", self.format());
        self.samples.clear();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format_and_clear() {
        let mut console = Console::new("Synthesized points");
        console.deliver(Sample::new("vmprop.vc1").overlay_tag("name", "web01").time(1));
        let out = console.format();
        assert!(out.starts_with("Measurement: vmprop.vc1\nTags: {name: web01}\n"));
        assert!(out.contains("Timestamp: 1"));
        console.flush().unwrap();
        assert_eq!("", console.format());
    }
}
