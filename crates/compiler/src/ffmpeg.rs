//! FFmpeg invocation module
//!
//! Describes one ffmpeg process (inputs, filter graph, output) and turns it
//! into a `Command`. Every encoded output uses the same fixed parameters so
//! clips from any stage can be concatenated without re-negotiating formats.

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// NTSC frame rate shared by every encoded output
pub const FRAME_RATE: &str = "30000/1001";
/// Video codec shared by every encoded output
pub const VIDEO_CODEC: &str = "libx264";
/// 4:2:0 8-bit, the widest-supported pixel format
pub const PIXEL_FORMAT: &str = "yuv420p";

/// Error type for engine invocations
#[derive(Debug, Error)]
pub enum EncodeError {
    /// ffmpeg exited with non-zero status
    #[error("ffmpeg failed with exit code {code}: {stderr}")]
    FfmpegFailed { code: i32, stderr: String },

    /// ffmpeg was terminated by signal
    #[error("ffmpeg process was terminated by signal")]
    FfmpegTerminated,

    /// IO error while spawning ffmpeg
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One `-i` input with its per-input options
#[derive(Debug, Clone, PartialEq)]
pub struct InputSpec {
    pub path: PathBuf,
    /// Seek before decoding (`-ss` ahead of `-i`)
    pub seek_secs: Option<f64>,
    /// Keep the stored orientation instead of applying rotation metadata
    pub no_autorotate: bool,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seek_secs: None,
            no_autorotate: false,
        }
    }

    pub fn seek(mut self, seconds: f64) -> Self {
        self.seek_secs = Some(seconds);
        self
    }

    pub fn no_autorotate(mut self) -> Self {
        self.no_autorotate = true;
        self
    }
}

/// Filters applied between input and output
#[derive(Debug, Clone, PartialEq)]
pub enum FilterGraph {
    /// Linear chain over the single input (`-vf`)
    Chain(String),
    /// Multi-input graph whose result is the pad `[output_label]`
    Complex { graph: String, output_label: String },
}

/// What the invocation writes
#[derive(Debug, Clone, PartialEq)]
pub enum OutputTarget {
    /// Encoded video file with the fixed output parameters
    Encode(PathBuf),
    /// No video output; a filter writes this side-car file instead
    Sidecar(PathBuf),
}

/// A complete ffmpeg process description
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegInvocation {
    pub inputs: Vec<InputSpec>,
    pub filter: Option<FilterGraph>,
    pub output: OutputTarget,
}

impl FfmpegInvocation {
    pub fn new(output: OutputTarget) -> Self {
        Self {
            inputs: Vec::new(),
            filter: None,
            output,
        }
    }

    pub fn input(mut self, input: InputSpec) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn filter(mut self, filter: FilterGraph) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The file this invocation creates when it succeeds
    pub fn produced_path(&self) -> &Path {
        match &self.output {
            OutputTarget::Encode(path) | OutputTarget::Sidecar(path) => path,
        }
    }

    /// Arguments passed to the ffmpeg binary
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        for input in &self.inputs {
            if input.no_autorotate {
                args.push("-noautorotate".to_string());
            }
            if let Some(seek) = input.seek_secs {
                args.push("-ss".to_string());
                args.push(format_secs(seek));
            }
            args.push("-i".to_string());
            args.push(input.path.to_string_lossy().into_owned());
        }

        match &self.filter {
            Some(FilterGraph::Chain(chain)) => {
                args.push("-vf".to_string());
                args.push(chain.clone());
            }
            Some(FilterGraph::Complex {
                graph,
                output_label,
            }) => {
                args.push("-filter_complex".to_string());
                args.push(graph.clone());
                args.push("-map".to_string());
                args.push(format!("[{}]", output_label));
            }
            None => {}
        }

        match &self.output {
            OutputTarget::Encode(path) => {
                // Sped-up clips have no meaningful audio; keep outputs video-only
                args.push("-an".to_string());
                args.push("-r".to_string());
                args.push(FRAME_RATE.to_string());
                args.push("-c:v".to_string());
                args.push(VIDEO_CODEC.to_string());
                args.push("-pix_fmt".to_string());
                args.push(PIXEL_FORMAT.to_string());
                args.push(path.to_string_lossy().into_owned());
            }
            OutputTarget::Sidecar(_) => {
                args.push("-f".to_string());
                args.push("null".to_string());
                args.push("-".to_string());
            }
        }

        args
    }

    /// Shell-like rendering for logs
    pub fn command_line(&self) -> String {
        let mut line = String::from("ffmpeg");
        for arg in self.args() {
            line.push(' ');
            if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == ';') {
                line.push('"');
                line.push_str(&arg.replace('"', "\\\""));
                line.push('"');
            } else {
                line.push_str(&arg);
            }
        }
        line
    }
}

/// Seconds with millisecond precision, as ffmpeg time options expect
pub fn format_secs(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Characters the option parser treats specially inside a filter's arguments
const OPTION_SPECIALS: &[char] = &['\\', '\'', ':'];
/// Characters the graph parser treats specially around a filter description
const GRAPH_SPECIALS: &[char] = &['\\', '\'', '[', ']', ',', ';'];

fn backslash_escape(value: &str, specials: &[char]) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if specials.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escape a value for use as one filter option inside a filter graph.
///
/// ffmpeg unescapes filter descriptions twice: once when splitting the graph
/// into filters and once when splitting a filter's arguments into options.
/// The value is escaped for the option parser first, then for the graph.
pub fn escape_filter_value(value: &str) -> String {
    backslash_escape(&backslash_escape(value, OPTION_SPECIALS), GRAPH_SPECIALS)
}

/// Build an ffmpeg command for the invocation
pub fn build_ffmpeg_command(invocation: &FfmpegInvocation) -> Command {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(invocation.args());
    cmd
}

/// Execute an invocation, blocking until ffmpeg exits
///
/// # Errors
/// Returns an error if:
/// - The ffmpeg process fails to start (IO error)
/// - The ffmpeg process exits with non-zero status (stderr is kept)
/// - The ffmpeg process is terminated by a signal
pub fn run_ffmpeg(invocation: &FfmpegInvocation) -> Result<(), EncodeError> {
    let output = build_ffmpeg_command(invocation).output()?;

    if output.status.success() {
        Ok(())
    } else {
        match output.status.code() {
            Some(code) => Err(EncodeError::FfmpegFailed {
                code,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
            None => Err(EncodeError::FfmpegTerminated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::ffi::OsStr;

    /// Helper to check if args contain a flag with a specific value
    fn has_flag_with_value(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|pair| pair[0] == flag && pair[1] == value)
    }

    #[test]
    fn test_encode_invocation_args() {
        let invocation = FfmpegInvocation::new(OutputTarget::Encode("/s/a-x.mp4".into()))
            .input(InputSpec::new("/in/a.mp4").no_autorotate().seek(47.5))
            .filter(FilterGraph::Chain("setpts=0.5*PTS".to_string()));
        let args = invocation.args();

        assert!(args.contains(&"-y".to_string()));
        assert!(has_flag_with_value(&args, "-ss", "47.500"));
        assert!(has_flag_with_value(&args, "-i", "/in/a.mp4"));
        assert!(has_flag_with_value(&args, "-vf", "setpts=0.5*PTS"));
        assert!(has_flag_with_value(&args, "-r", FRAME_RATE));
        assert!(has_flag_with_value(&args, "-c:v", VIDEO_CODEC));
        assert!(has_flag_with_value(&args, "-pix_fmt", PIXEL_FORMAT));
        assert_eq!(args.last().map(String::as_str), Some("/s/a-x.mp4"));

        // Input options precede their -i
        let noauto = args.iter().position(|a| a == "-noautorotate").unwrap();
        let seek = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(noauto < input && seek < input);
    }

    #[test]
    fn test_complex_graph_maps_output_label() {
        let invocation = FfmpegInvocation::new(OutputTarget::Encode("/o.mp4".into()))
            .input(InputSpec::new("/a.mp4"))
            .input(InputSpec::new("/b.mp4"))
            .filter(FilterGraph::Complex {
                graph: "[0:v][1:v]concat=n=2:v=1:a=0[out]".to_string(),
                output_label: "out".to_string(),
            });
        let args = invocation.args();

        assert!(has_flag_with_value(&args, "-map", "[out]"));
        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 2);
    }

    #[test]
    fn test_sidecar_invocation_discards_video() {
        let invocation = FfmpegInvocation::new(OutputTarget::Sidecar("/s/a.trf".into()))
            .input(InputSpec::new("/s/a.mp4"));
        let args = invocation.args();

        assert!(has_flag_with_value(&args, "-f", "null"));
        assert_eq!(args.last().map(String::as_str), Some("-"));
        assert!(!args.contains(&"-c:v".to_string()));
        assert_eq!(invocation.produced_path(), Path::new("/s/a.trf"));
    }

    #[test]
    fn test_build_command_program() {
        let invocation = FfmpegInvocation::new(OutputTarget::Encode("/o.mp4".into()))
            .input(InputSpec::new("/a.mp4"));
        let cmd = build_ffmpeg_command(&invocation);
        assert_eq!(cmd.get_program(), OsStr::new("ffmpeg"));
        assert_eq!(cmd.get_args().count(), invocation.args().len());
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let invocation = FfmpegInvocation::new(OutputTarget::Encode("/out dir/o.mp4".into()))
            .input(InputSpec::new("/a.mp4"));
        assert!(invocation.command_line().ends_with("\"/out dir/o.mp4\""));
    }

    /// One ffmpeg unescaping pass over a single token
    fn unescape(value: &str) -> String {
        let mut plain = String::new();
        let mut chars = value.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => plain.extend(chars.next()),
                c => plain.push(c),
            }
        }
        plain
    }

    #[test]
    fn test_escape_filter_value() {
        assert_eq!(escape_filter_value("Week 3"), "Week 3");
        assert_eq!(escape_filter_value("/tmp/a:b.trf"), "/tmp/a\\\\:b.trf");
        assert_eq!(escape_filter_value("it's"), "it\\\\\\'s");
        assert_eq!(escape_filter_value("a,b;[c]"), "a\\,b\\;\\[c\\]");
        assert_eq!(escape_filter_value("C:\\x"), "C\\\\:\\\\\\\\x");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_filter_value_survives_both_parsers(value in "[ -~]{0,32}") {
            let escaped = escape_filter_value(&value);
            prop_assert_eq!(unescape(&unescape(&escaped)), value);
        }

        #[test]
        fn prop_encoded_outputs_share_parameters(
            inputs in proptest::collection::vec("[a-zA-Z0-9_/.-]{1,30}", 1..5),
            output in "[a-zA-Z0-9_/.-]{1,30}",
        ) {
            let mut invocation = FfmpegInvocation::new(OutputTarget::Encode(PathBuf::from(&output)));
            for input in &inputs {
                invocation = invocation.input(InputSpec::new(input));
            }
            let args = invocation.args();

            prop_assert!(has_flag_with_value(&args, "-r", FRAME_RATE));
            prop_assert!(has_flag_with_value(&args, "-c:v", VIDEO_CODEC));
            prop_assert!(has_flag_with_value(&args, "-pix_fmt", PIXEL_FORMAT));
            prop_assert_eq!(args.iter().filter(|a| *a == "-i").count(), inputs.len());
            prop_assert_eq!(args.last().cloned(), Some(output));
        }
    }
}
