use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Only the crate's own sources are policed; vendored or reference trees are not.
const SOURCE_DIRS: [&str; 4] = ["scan", "src", "tests", "benches"];

// A custom "Sink" for the grep searcher. It collects all matching lines
// from a single file to build a comprehensive error message.
struct ViolationCollector {
    violations: Vec<String>,
    file_path: PathBuf,
    what: &'static str,
    advice: &'static str,
    skip_comments_and_strings: bool,
}

impl ViolationCollector {
    fn new(
        file_path: &Path,
        what: &'static str,
        advice: &'static str,
        skip_comments_and_strings: bool,
    ) -> Self {
        Self {
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
            what,
            advice,
            skip_comments_and_strings,
        }
    }

    // After searching, this method checks if any violations were found.
    // If so, it formats a detailed error message and returns it.
    fn check_and_get_error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            self.what,
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.advice));

        Some(error_msg)
    }
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if self.skip_comments_and_strings {
            let is_pure_comment = line_text.trim_start().starts_with("//");
            // Anything between a pair of quotes is a string literal, not a binding.
            let is_in_string = line_text
                .split('"')
                .enumerate()
                .any(|(i, part)| i % 2 == 1 && part.contains('_'));
            if is_pure_comment || is_in_string {
                return Ok(true);
            }
        }

        self.violations.push(format!("{line_number}:{line_text}"));
        Ok(true)
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SOURCE_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let checks = [
        (
            r"\b(_[a-zA-Z0-9_]+)\b",
            "underscore-prefixed variables",
            "Underscore-prefixed variable names are not allowed in this project. Either use the variable or remove it completely.",
            true,
        ),
        (
            r"#\[allow\(dead_code\)\]",
            "#[allow(dead_code)] attributes",
            "#[allow(dead_code)] attributes are STRICTLY FORBIDDEN in this project. Either use the code or remove it completely.",
            false,
        ),
    ];

    for (pattern, what, advice, skip_comments_and_strings) in checks {
        if let Err(e) = scan_sources(pattern, what, advice, skip_comments_and_strings) {
            // The `eprintln!` here is crucial for showing the error in `cargo`'s output.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn scan_sources(
    pattern: &str,
    what: &'static str,
    advice: &'static str,
    skip_comments_and_strings: bool,
) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(pattern)?;
    let mut searcher = Searcher::new();

    for entry in SOURCE_DIRS
        .iter()
        .flat_map(|dir| WalkDir::new(dir).into_iter())
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
    {
        let path = entry.path();
        let mut collector = ViolationCollector::new(path, what, advice, skip_comments_and_strings);
        searcher.search_path(&matcher, path, &mut collector)?;
        if let Some(error_message) = collector.check_and_get_error_message() {
            return Err(error_message.into());
        }
    }
    Ok(())
}
