//! Word-wrapping for styled ratatui lines.
//!
//! `textwrap` only understands plain strings, so a styled `Line` is flattened, wrapped as text,
//! and the resulting byte ranges are mapped back onto the original spans. Indents are styled
//! `Line`s of their own and are prepended after wrapping, which keeps them out of the width
//! computation for the text itself.

use ratatui::text::Line;
use ratatui::text::Span;
use std::borrow::Cow;
use std::ops::Range;
use textwrap::Options;

use crate::render::line_utils::push_owned_lines;

/// Byte ranges into `text` for each wrapped line, without trailing whitespace.
fn wrap_ranges_trim(text: &str, opts: &Options<'_>) -> Vec<Range<usize>> {
    let base = text.as_ptr() as usize;
    let mut lines: Vec<Range<usize>> = Vec::new();
    let mut cursor = 0usize;
    for line in textwrap::wrap(text, opts) {
        match line {
            Cow::Borrowed(slice) if !slice.is_empty() => {
                let start = (slice.as_ptr() as usize)
                    .saturating_sub(base)
                    .min(text.len());
                let end = (start + slice.len()).min(text.len());
                lines.push(start..end);
                cursor = end;
            }
            Cow::Borrowed(_) => lines.push(cursor..cursor),
            Cow::Owned(owned) => {
                // Owned lines carry a synthesized hyphenation penalty; map the
                // remaining characters back onto the source text.
                let needle = owned.trim_end_matches('-');
                match text[cursor..].find(needle) {
                    Some(pos) => {
                        let start = cursor + pos;
                        cursor = start + needle.len();
                        lines.push(start..cursor);
                    }
                    None => {
                        tracing::warn!(
                            wrapped = %owned,
                            cursor,
                            "could not map wrapped line back onto source text"
                        );
                        lines.push(cursor..cursor);
                    }
                }
            }
        }
    }
    lines
}

#[derive(Debug, Clone)]
pub(crate) struct RtOptions<'a> {
    /// The width in columns at which the text will be wrapped.
    pub width: usize,
    /// Indentation used for the first line of output.
    pub initial_indent: Line<'a>,
    /// Indentation used for subsequent lines of output.
    pub subsequent_indent: Line<'a>,
    /// Allow long words to be broken if they cannot fit on a line.
    pub break_words: bool,
    pub wrap_algorithm: textwrap::WrapAlgorithm,
    pub word_splitter: textwrap::WordSplitter,
}

impl From<usize> for RtOptions<'_> {
    fn from(width: usize) -> Self {
        RtOptions::new(width)
    }
}

impl<'a> RtOptions<'a> {
    pub fn new(width: usize) -> Self {
        RtOptions {
            width,
            initial_indent: Line::default(),
            subsequent_indent: Line::default(),
            break_words: true,
            wrap_algorithm: textwrap::WrapAlgorithm::FirstFit,
            word_splitter: textwrap::WordSplitter::NoHyphenation,
        }
    }

    pub fn initial_indent(self, initial_indent: Line<'a>) -> Self {
        RtOptions {
            initial_indent,
            ..self
        }
    }

    pub fn subsequent_indent(self, subsequent_indent: Line<'a>) -> Self {
        RtOptions {
            subsequent_indent,
            ..self
        }
    }
}

#[must_use]
pub(crate) fn word_wrap_line<'a, O>(line: &'a Line<'a>, width_or_options: O) -> Vec<Line<'a>>
where
    O: Into<RtOptions<'a>>,
{
    // Flatten the line and record span byte ranges.
    let mut flat = String::new();
    let mut span_bounds = Vec::new();
    let mut acc = 0usize;
    for s in &line.spans {
        let text = s.content.as_ref();
        let start = acc;
        flat.push_str(text);
        acc += text.len();
        span_bounds.push((start..acc, s.style));
    }

    let rt_opts: RtOptions<'a> = width_or_options.into();
    let opts = Options::new(rt_opts.width)
        .break_words(rt_opts.break_words)
        .wrap_algorithm(rt_opts.wrap_algorithm)
        .word_splitter(rt_opts.word_splitter.clone());

    let mut out: Vec<Line<'a>> = Vec::new();

    let initial_width_available = opts
        .width
        .saturating_sub(rt_opts.initial_indent.width())
        .max(1);
    let initial_wrapped = wrap_ranges_trim(&flat, &opts.clone().width(initial_width_available));
    let Some(first_line_range) = initial_wrapped.first() else {
        return vec![rt_opts.initial_indent.clone()];
    };

    let mut first_line = rt_opts.initial_indent.clone().style(line.style);
    let sliced = slice_line_spans(line, &span_bounds, first_line_range);
    first_line
        .spans
        .extend(sliced.spans.into_iter().map(|s| s.patch_style(line.style)));
    out.push(first_line);

    // Wrap the remainder using the subsequent indent width and map back to original indices.
    let base = first_line_range.end;
    let skip_leading_spaces = flat[base..].chars().take_while(|c| *c == ' ').count();
    let base = base + skip_leading_spaces;
    let subsequent_width_available = opts
        .width
        .saturating_sub(rt_opts.subsequent_indent.width())
        .max(1);
    let remaining_wrapped =
        wrap_ranges_trim(&flat[base..], &opts.width(subsequent_width_available));
    for r in &remaining_wrapped {
        if r.is_empty() {
            continue;
        }
        let mut subsequent_line = rt_opts.subsequent_indent.clone().style(line.style);
        let offset_range = (r.start + base)..(r.end + base);
        let sliced = slice_line_spans(line, &span_bounds, &offset_range);
        subsequent_line
            .spans
            .extend(sliced.spans.into_iter().map(|s| s.patch_style(line.style)));
        out.push(subsequent_line);
    }

    out
}

/// Wrap a sequence of lines, applying the initial indent only to the very first
/// output line, and using the subsequent indent for all later wrapped pieces.
pub(crate) fn word_wrap_lines<'a, I, O>(lines: I, width_or_options: O) -> Vec<Line<'static>>
where
    I: IntoIterator<Item = Line<'a>>,
    O: Into<RtOptions<'a>>,
{
    let base_opts: RtOptions<'a> = width_or_options.into();
    let mut out: Vec<Line<'static>> = Vec::new();

    for (idx, line) in lines.into_iter().enumerate() {
        let opts = if idx == 0 {
            base_opts.clone()
        } else {
            base_opts
                .clone()
                .initial_indent(base_opts.subsequent_indent.clone())
        };
        let wrapped = word_wrap_line(&line, opts);
        push_owned_lines(&wrapped, &mut out);
    }

    out
}

fn slice_line_spans<'a>(
    original: &'a Line<'a>,
    span_bounds: &[(Range<usize>, ratatui::style::Style)],
    range: &Range<usize>,
) -> Line<'a> {
    let start_byte = range.start;
    let end_byte = range.end;
    let mut acc: Vec<Span<'a>> = Vec::new();
    for (i, (range, style)) in span_bounds.iter().enumerate() {
        let s = range.start;
        let e = range.end;
        if e <= start_byte {
            continue;
        }
        if s >= end_byte {
            break;
        }
        let seg_start = start_byte.max(s);
        let seg_end = end_byte.min(e);
        if seg_end > seg_start {
            let content = original.spans[i].content.as_ref();
            if let Some(slice) = content.get(seg_start - s..seg_end - s) {
                acc.push(Span {
                    style: *style,
                    content: Cow::Borrowed(slice),
                });
            }
        }
        if e >= end_byte {
            break;
        }
    }
    Line {
        style: original.style,
        alignment: original.alignment,
        spans: acc,
    }
}
