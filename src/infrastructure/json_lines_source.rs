// Newline-delimited JSON event source (stdin, files, pipes)
use crate::application::event_source::{EventSource, IngressError};
use crate::domain::sensor_event::SensorEvent;
use crate::infrastructure::backend_message::decode_message;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct JsonLinesSource<R> {
    name: String,
    lines: Lines<R>,
    line_no: u64,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl JsonLinesSource<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new("stdin", BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> EventSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_batch(&mut self) -> Result<Option<Vec<SensorEvent>>, IngressError> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            match decode_message(&line) {
                Ok(events) if events.is_empty() => continue,
                Ok(events) => return Ok(Some(events)),
                Err(e) => {
                    tracing::warn!(source = %self.name, line = self.line_no, error = %e, "skipping malformed line");
                }
            }
        }
    }
}
