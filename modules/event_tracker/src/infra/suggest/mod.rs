pub mod gemini;

pub use gemini::GeminiSuggester;
