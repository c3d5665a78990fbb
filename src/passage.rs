use crate::error::{Error, Result};
use cgisf_lib::cgisf;
use include_dir::{include_dir, Dir};
use rand::Rng;
use std::path::Path;

static PASSAGE_DIR: Dir = include_dir!("src/passages");

const SENTENCES_PER_PARAGRAPH: usize = 3;

/// A resolved piece of reading material: title, full text, word count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    pub title: String,
    pub text: String,
    pub word_count: usize,
}

impl Passage {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let word_count = count_words(&text);
        Self {
            title: title.into(),
            text,
            word_count,
        }
    }
}

/// Whitespace-token count, the word-count definition used everywhere
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Titles of the embedded passage library, sorted
pub fn builtin_titles() -> Vec<String> {
    let mut titles: Vec<String> = PASSAGE_DIR
        .files()
        .filter_map(|f| {
            let path = f.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("txt") => path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string),
                _ => None,
            }
        })
        .collect();
    titles.sort();
    titles
}

/// Load an embedded passage by title
pub fn load_builtin(title: &str) -> Result<Passage> {
    let file = PASSAGE_DIR
        .get_file(format!("{title}.txt"))
        .ok_or_else(|| Error::not_found(format!("no embedded passage named '{title}'")))?;
    let text = file
        .contents_utf8()
        .ok_or_else(|| Error::validation(format!("embedded passage '{title}' is not utf-8")))?;
    Ok(Passage::new(title, text))
}

/// Load reading material from a file on disk
pub fn load_file(path: &Path) -> Result<Passage> {
    if !path.exists() {
        return Err(Error::not_found(format!("{}", path.display())));
    }
    let text = std::fs::read_to_string(path)?;
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file")
        .to_string();
    Ok(Passage::new(title, text))
}

/// Wrap user-supplied inline text
pub fn from_text(text: &str) -> Passage {
    Passage::new("pasted text", text)
}

/// Generate practice text sentence by sentence, grouped into paragraphs so
/// paragraph mode has something to highlight
pub fn generate_sentences(count: usize) -> Passage {
    let rng = &mut rand::thread_rng();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for _ in 0..count {
        let sentence = cgisf(
            rng.gen_range(1..3),
            rng.gen_range(1..3),
            rng.gen_range(1..5),
            rng.gen_bool(0.5),
            rng.gen_range(1..3),
            rng.gen_bool(0.5),
        );
        current.push(sentence.trim().to_string());
        if current.len() == SENTENCES_PER_PARAGRAPH {
            paragraphs.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }
    Passage::new("generated text", paragraphs.join("\n\n"))
}
