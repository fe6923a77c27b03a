// Copyright 2023. The Tari Project
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

//! End-to-end call flows over real TCP connections.

mod helpers;

use helpers::{Client, TestServer};

#[tokio::test]
async fn simple_call() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;
    let mut c1 = Client::connect(server.addr).await;
    c1.expect("ON HOOK 1").await;

    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;

    c0.send("dial 1").await;
    c0.expect("RING BACK").await;
    c1.expect("RINGING").await;

    c1.send("pickup").await;
    c1.expect("CONNECTED 0").await;
    c0.expect("CONNECTED 1").await;

    c0.send("chat hello").await;
    c1.expect("CHAT hello").await;
    c0.expect("CONNECTED 1").await;

    c1.send("chat hi yourself").await;
    c0.expect("CHAT hi yourself").await;
    c1.expect("CONNECTED 0").await;

    c0.send("hangup").await;
    c0.expect("ON HOOK 0").await;
    c1.expect("DIAL TONE").await;
}

#[tokio::test]
async fn dialling_a_busy_extension() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;
    let mut c1 = Client::connect(server.addr).await;
    c1.expect("ON HOOK 1").await;
    let mut c2 = Client::connect(server.addr).await;
    c2.expect("ON HOOK 2").await;

    // c1 and c2 establish a call
    c1.send("pickup").await;
    c1.expect("DIAL TONE").await;
    c1.send("dial 2").await;
    c1.expect("RING BACK").await;
    c2.expect("RINGING").await;
    c2.send("pickup").await;
    c2.expect("CONNECTED 1").await;
    c1.expect("CONNECTED 2").await;

    // c0 dials the connected c1 and hears a busy signal
    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;
    c0.send("dial 1").await;
    c0.expect("BUSY SIGNAL").await;

    // c1 heard nothing about the failed attempt: its next notification is the
    // acknowledgment of its own chat
    c1.send("chat all quiet").await;
    c1.expect("CONNECTED 2").await;
    c2.expect("CHAT all quiet").await;
}

#[tokio::test]
async fn dialling_yourself() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;

    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;
    c0.send("dial 0").await;
    c0.expect("BUSY SIGNAL").await;
}

#[tokio::test]
async fn dialling_an_unknown_extension() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;

    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;
    c0.send("dial 99").await;
    c0.expect("ERROR").await;

    // Hanging up clears the error state
    c0.send("hangup").await;
    c0.expect("ON HOOK 0").await;
}

#[tokio::test]
async fn caller_abandons_before_the_callee_answers() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;
    let mut c1 = Client::connect(server.addr).await;
    c1.expect("ON HOOK 1").await;

    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;
    c0.send("dial 1").await;
    c0.expect("RING BACK").await;
    c1.expect("RINGING").await;

    c0.send("hangup").await;
    c0.expect("ON HOOK 0").await;
    c1.expect("ON HOOK 1").await;
}

#[tokio::test]
async fn commands_split_across_packets_are_buffered() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;

    c0.send_raw(b"pic").await;
    c0.send_raw(b"kup\r").await;
    c0.send_raw(b"\n").await;
    c0.expect("DIAL TONE").await;

    // Two commands in a single write are both serviced
    c0.send_raw(b"hangup\r\npickup\r\n").await;
    c0.expect("ON HOOK 0").await;
    c0.expect("DIAL TONE").await;
}

#[tokio::test]
async fn out_of_state_commands_echo_the_current_state() {
    let server = TestServer::spawn().await;
    let mut c0 = Client::connect(server.addr).await;
    c0.expect("ON HOOK 0").await;

    // A chat with no call in progress is acknowledged with the unchanged state
    c0.send("chat anyone?").await;
    c0.expect("ON HOOK 0").await;

    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;
    c0.send("pickup").await;
    c0.expect("DIAL TONE").await;
}
