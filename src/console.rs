//! Console presentation handlers.
//!
//! Terminal fallbacks for the two shipped input types: a permission prompt
//! with a `y/n/session` line protocol and a numbered clarification
//! questionnaire. Both are generic over their input/output streams so tests
//! can script the operator.

use std::io::{self, BufRead, BufReader, Stdin, Write};

use crossterm::style::{Color, Stylize};

use crate::bridge::{PresentationHandler, Responder};
use crate::provider::clarification::{answers_payload, ClarificationAnswer, CLARIFICATION_TYPE_ID};
use crate::provider::permission::PERMISSION_TYPE_ID;
use crate::provider::PermissionDecision;
use crate::types::InputRequest;

// ---------------------------------------------------------------------------
// Permission prompt
// ---------------------------------------------------------------------------

/// Permission prompt over a line-based terminal.
pub struct ConsolePermissionHandler<R, W> {
    color: bool,
    input: R,
    output: W,
}

impl ConsolePermissionHandler<BufReader<Stdin>, io::Stderr> {
    /// Prompt on the process stdin/stderr pair.
    pub fn stdio(color: bool) -> Self {
        Self::new(color, BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead + Send, W: Write + Send> ConsolePermissionHandler<R, W> {
    pub fn new(color: bool, input: R, output: W) -> Self {
        Self {
            color,
            input,
            output,
        }
    }

    fn prompt(&mut self, resource: &str, operation: &str) -> io::Result<String> {
        if self.color {
            writeln!(
                self.output,
                "{} the agent requests permission to {}",
                "•".with(Color::DarkGrey),
                operation.with(Color::Yellow).bold()
            )?;
            writeln!(self.output, "  {}", resource.with(Color::White))?;
        } else {
            writeln!(self.output, "• the agent requests permission to {operation}")?;
            writeln!(self.output, "  {resource}")?;
        }
        write!(self.output, "  grant? (y/n/session): ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line.trim().to_ascii_lowercase())
    }
}

impl<R: BufRead + Send, W: Write + Send> PresentationHandler for ConsolePermissionHandler<R, W> {
    fn type_id(&self) -> &'static str {
        PERMISSION_TYPE_ID
    }

    fn handle(&mut self, request: InputRequest, responder: &Responder) {
        let resource = request
            .data
            .get("resource")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        let operation = request
            .data
            .get("operation")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        match self.prompt(&resource, &operation) {
            Ok(answer) => {
                let decision = match answer.as_str() {
                    "session" => PermissionDecision::AllowSession,
                    "y" | "yes" => PermissionDecision::AllowOnce,
                    _ => PermissionDecision::Deny,
                };
                responder.send(&request.request_id, Some(decision.into_payload()), false);
            }
            Err(err) => {
                tracing::warn!(%err, "permission prompt aborted");
                responder.send(&request.request_id, None, true);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Clarification prompt
// ---------------------------------------------------------------------------

/// Clarification questionnaire over a line-based terminal.
pub struct ConsoleClarificationHandler<R, W> {
    color: bool,
    input: R,
    output: W,
}

impl ConsoleClarificationHandler<BufReader<Stdin>, io::Stderr> {
    /// Prompt on the process stdin/stderr pair.
    pub fn stdio(color: bool) -> Self {
        Self::new(color, BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead + Send, W: Write + Send> ConsoleClarificationHandler<R, W> {
    pub fn new(color: bool, input: R, output: W) -> Self {
        Self {
            color,
            input,
            output,
        }
    }

    fn ask_one(&mut self, index: usize, question: &str) -> io::Result<String> {
        if self.color {
            writeln!(
                self.output,
                "{} {}",
                format!("question {index}:").with(Color::Cyan).bold(),
                question
            )?;
        } else {
            writeln!(self.output, "question {index}: {question}")?;
        }
        write!(self.output, "> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead + Send, W: Write + Send> PresentationHandler
    for ConsoleClarificationHandler<R, W>
{
    fn type_id(&self) -> &'static str {
        CLARIFICATION_TYPE_ID
    }

    fn handle(&mut self, request: InputRequest, responder: &Responder) {
        let questions: Vec<String> = request
            .data
            .get("questions")
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|q| q.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut answers = Vec::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            match self.ask_one(index + 1, question) {
                Ok(response) => answers.push(ClarificationAnswer {
                    question: question.clone(),
                    response,
                }),
                Err(err) => {
                    tracing::warn!(%err, "clarification prompt aborted");
                    responder.send(&request.request_id, None, true);
                    return;
                }
            }
        }
        responder.send(&request.request_id, Some(answers_payload(&answers)), false);
    }
}
