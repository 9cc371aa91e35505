//! Feed a transcript through the engine, one message per line.

use luca_consciousness::Engine;
use luca_core::{AnalysisResult, ConsciousnessState, ConversationId, Error, Result};
use serde::Serialize;
use std::io::BufRead;

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub conversation_id: ConversationId,
    pub results: Vec<AnalysisResult>,
    pub state: ConsciousnessState,
}

/// Process every non-blank line of `input` as a message in `conversation`.
pub fn replay(engine: &Engine, conversation: &ConversationId, input: impl BufRead) -> Result<ReplaySummary> {
    let mut results = Vec::new();
    for (index, line) in input.split(b'\n').enumerate() {
        let line = line?;
        let message = line.strip_suffix(b"\r").unwrap_or(&line[..]);
        if message.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let result = engine.process_bytes(conversation, message).map_err(|e| match e {
            Error::InputDomain(msg) => Error::input_domain(format!("line {}: {}", index + 1, msg)),
            other => other,
        })?;
        results.push(result);
    }
    tracing::info!("Replayed {} messages into {}", results.len(), conversation);
    Ok(ReplaySummary {
        conversation_id: conversation.clone(),
        results,
        state: engine.aggregate_state()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use luca_consciousness::EngineConfig;
    use std::io::Cursor;

    #[test]
    fn blank_lines_are_skipped() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let input = Cursor::new("Hello\n\n   \r\nHello\r\n");
        let summary = replay(&engine, &ConversationId::new("r"), input).unwrap();
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.results[1].ordinal, 2);
        assert_eq!(summary.state.total_thoughts, 2);
    }

    #[test]
    fn invalid_utf8_line_is_reported_by_number() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        let input = Cursor::new(b"fine\n\xc3\x28\n".to_vec());
        let err = replay(&engine, &ConversationId::new("r"), input).unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("line 2"));
    }
}
