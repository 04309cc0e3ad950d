//! Command line driver.
//!
//! `contextify [FILE]... -- [OPTION]...`: everything before the `--`
//! separator names an input translation unit, everything after it is passed
//! verbatim to the C parser.  The rewritten program is written to stdout;
//! diagnostics and the discovery counts go to stderr.

use std::env;
use std::io;
use std::process;

use clap::{App, Arg};
use log::error;

fn app() -> App<'static, 'static> {
    App::new("contextify")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Transform all FILEs, supplying for each the given OPTIONs to the compiler")
        .usage("contextify [FILE]... -- [OPTION]...")
        .arg(
            Arg::with_name("FILE")
                .help("Input translation units to rewrite")
                .multiple(true),
        )
        .arg(
            Arg::with_name("OPTION")
                .help("Options passed verbatim to the C parser")
                .multiple(true)
                .last(true)
                .allow_hyphen_values(true),
        )
}

/// Splits the raw argument vector into input filenames and pass-through
/// parser options.  `--help` wins wherever it appears, even after the
/// separator.
fn classify_args(arguments: &[String]) -> Result<(Vec<String>, Vec<String>), clap::Error> {
    if arguments.iter().skip(1).any(|argument| argument == "--help") {
        return Err(app()
            .get_matches_from_safe(["contextify", "--help"])
            .unwrap_err());
    }

    let matches = app().get_matches_from_safe(arguments.iter())?;
    let filenames = matches
        .values_of("FILE")
        .map_or_else(Vec::new, |values| values.map(str::to_owned).collect());
    let options = matches
        .values_of("OPTION")
        .map_or_else(Vec::new, |values| values.map(str::to_owned).collect());
    Ok((filenames, options))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let arguments: Vec<String> = env::args().collect();
    let (filenames, options) = match classify_args(&arguments) {
        Ok(split) => split,
        Err(error) => error.exit(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(error) = contextify::transform(&filenames, &options, &mut out) {
        error!("{}", error);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::ErrorKind;

    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        let mut arguments = vec!["contextify".to_owned()];
        arguments.extend(raw.iter().map(|s| (*s).to_owned()));
        arguments
    }

    #[test]
    fn splits_filenames_from_options_at_separator() {
        let (filenames, options) = classify_args(&args(&["a.c", "b.c", "--", "-I."])).unwrap();
        assert_eq!(filenames, ["a.c", "b.c"]);
        assert_eq!(options, ["-I."]);
    }

    #[test]
    fn reconstructing_the_argument_vector_round_trips() {
        let raw = args(&["simplelib/func1.c", "simplelib/func2.c", "--", "-I.", "-DX=1"]);
        let (filenames, options) = classify_args(&raw).unwrap();

        let mut rebuilt = filenames;
        rebuilt.push("--".to_owned());
        rebuilt.extend(options);
        assert_eq!(rebuilt, &raw[1..]);
    }

    #[test]
    fn without_separator_every_argument_is_a_filename() {
        let (filenames, options) = classify_args(&args(&["a.c", "b.c"])).unwrap();
        assert_eq!(filenames, ["a.c", "b.c"]);
        assert!(options.is_empty());
    }

    #[test]
    fn empty_invocation_is_accepted() {
        let (filenames, options) = classify_args(&args(&[])).unwrap();
        assert!(filenames.is_empty());
        assert!(options.is_empty());
    }

    #[test]
    fn help_is_recognized_anywhere() {
        let error = classify_args(&args(&["--help"])).unwrap_err();
        assert_matches!(error.kind, ErrorKind::HelpDisplayed);

        let error = classify_args(&args(&["a.c", "--", "--help"])).unwrap_err();
        assert_matches!(error.kind, ErrorKind::HelpDisplayed);
    }
}
