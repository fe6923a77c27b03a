// Copyright 2022. The Tari Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Timeout-guarded line readers for tests that speak the server's CRLF-delimited protocol.

use std::time::Duration;

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    time,
};

const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Read one CRLF-terminated line, panicking on timeout, EOF or a missing terminator.
/// The returned line has the terminator stripped.
pub async fn recv_line<R>(reader: &mut R) -> String
where R: AsyncBufRead + Unpin {
    let mut line = String::new();
    let read = time::timeout(READ_TIMEOUT, reader.read_line(&mut line))
        .await
        .expect("Timeout waiting for a line")
        .expect("Socket read failed");
    assert!(read > 0, "Connection closed while expecting a line");
    assert!(line.ends_with("\r\n"), "Line was not CRLF terminated: {:?}", line);
    line.truncate(line.len() - 2);
    line
}

/// Assert that the stream reaches EOF (returns no further lines) within the timeout.
pub async fn expect_eof<R>(reader: &mut R)
where R: AsyncBufRead + Unpin {
    let mut line = String::new();
    let read = time::timeout(READ_TIMEOUT, reader.read_line(&mut line))
        .await
        .expect("Timeout waiting for EOF")
        .expect("Socket read failed");
    assert_eq!(read, 0, "Expected EOF but read line: {:?}", line);
}
