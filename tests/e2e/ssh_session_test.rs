#[allow(dead_code, unused_imports)]
mod helpers;

use helpers::*;
use sshpot::attempts::record::AttemptRecord;
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, Duration};

const PROMPT: &str = "admin@e2e-host:~$ ";

#[tokio::test]
async fn test_login_is_recorded_and_banner_sent() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;

    let logins: Vec<_> = pot
        .records()
        .into_iter()
        .filter(|r| matches!(r, AttemptRecord::LoginAttempt { .. }))
        .collect();
    assert_eq!(logins.len(), 1);
    match &logins[0] {
        AttemptRecord::LoginAttempt {
            username,
            password,
            ip,
            protocol,
            ..
        } => {
            assert_eq!(username, "admin");
            assert_eq!(password, "admin123");
            assert_eq!(ip, "127.0.0.1");
            assert_eq!(protocol, "ssh");
        }
        other => panic!("unexpected record: {other:?}"),
    }

    let channel = handle.channel_open_session().await.unwrap();
    channel.request_shell(true).await.unwrap();
    let mut stream = channel.into_stream();
    let initial = read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;
    assert!(initial.contains("Welcome to Ubuntu"), "banner missing: {initial}");
    assert!(initial.ends_with(PROMPT), "prompt missing: {initial}");
}

#[tokio::test]
async fn test_shell_whoami_then_exit() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let channel = handle.channel_open_session().await.unwrap();
    channel.request_shell(true).await.unwrap();
    let mut stream = channel.into_stream();
    read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;

    stream.write_all(b"whoami\r").await.unwrap();
    let out = read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;
    assert_eq!(out, format!("whoami\r\nadmin\r\n{PROMPT}"));

    stream.write_all(b"ex\x7fxit\r").await.unwrap();
    let out = read_to_end(&mut stream, Duration::from_secs(5)).await;
    assert!(out.ends_with("logout\r\nConnection to e2e-host closed.\r\n"), "{out}");
    assert!(!out.contains(PROMPT));

    assert_eq!(pot.commands(), vec!["whoami", "exit"]);
}

#[tokio::test]
async fn test_shell_cat_shadow() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let channel = handle.channel_open_session().await.unwrap();
    channel.request_shell(true).await.unwrap();
    let mut stream = channel.into_stream();
    read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;

    stream.write_all(b"cat /etc/shadow\r").await.unwrap();
    let out = read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;
    assert!(out.contains("cat: /etc/shadow: No such file or directory\r\n"), "{out}");
    assert!(out.ends_with(PROMPT));
    assert_eq!(pot.commands(), vec!["cat /etc/shadow"]);
}

#[tokio::test]
async fn test_shell_with_pty() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "root", "toor").await;
    let channel = handle.channel_open_session().await.unwrap();
    channel
        .request_pty(true, "xterm", 80, 24, 0, 0, &[])
        .await
        .unwrap();
    channel.request_shell(true).await.unwrap();
    let mut stream = channel.into_stream();
    let prompt = "root@e2e-host:~$ ";
    read_until(&mut stream, prompt, Duration::from_secs(5)).await;

    stream.write_all(b"sudo su\r").await.unwrap();
    let out = read_until(&mut stream, prompt, Duration::from_secs(5)).await;
    assert!(out.contains("[sudo] password for root: "), "{out}");
    assert!(out.contains("root is not in the sudoers file."), "{out}");
}

#[tokio::test]
async fn test_exec_is_recorded_and_closed() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let channel = handle.channel_open_session().await.unwrap();
    channel.exec(true, "uname -a").await.unwrap();

    let mut stream = channel.into_stream();
    let out = read_to_end(&mut stream, Duration::from_secs(5)).await;
    assert_eq!(out, "Command 'uname -a' executed.\r\n$ ");
    assert_eq!(pot.commands(), vec!["uname -a"]);
}

#[tokio::test]
async fn test_client_eof_ends_shell() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let channel = handle.channel_open_session().await.unwrap();
    channel.request_shell(true).await.unwrap();
    let mut stream = channel.into_stream();
    read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;

    stream.write_all(b"id\r").await.unwrap();
    read_until(&mut stream, PROMPT, Duration::from_secs(5)).await;
    stream.shutdown().await.unwrap();

    let rest = read_to_end(&mut stream, Duration::from_secs(5)).await;
    assert!(!rest.contains("uid="));
    assert_eq!(pot.commands(), vec!["id"]);
}

#[tokio::test]
async fn test_no_shell_request_is_dropped() {
    let pot = start_honeypot_with(
        test_config(),
        Duration::from_secs(5),
        Duration::from_millis(300),
    )
    .await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let _channel = handle.channel_open_session().await.unwrap();

    // Shell timeout plus disconnect should close the transport
    for _ in 0..50 {
        if handle.is_closed() {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert!(handle.is_closed(), "session should be dropped after shell timeout");
    assert!(pot.commands().is_empty());
}

#[tokio::test]
async fn test_no_channel_is_dropped() {
    let pot = start_honeypot_with(
        test_config(),
        Duration::from_millis(300),
        Duration::from_secs(5),
    )
    .await;
    let handle = connect(pot.port, "admin", "admin123").await;

    for _ in 0..50 {
        if handle.is_closed() {
            break;
        }
        sleep(Duration::from_millis(100)).await;
    }
    assert!(handle.is_closed(), "session should be dropped after channel timeout");
    assert_eq!(pot.records().len(), 1);
}

#[tokio::test]
async fn test_concurrent_sessions_are_independent() {
    let pot = start_honeypot().await;

    let mut tasks = Vec::new();
    for i in 0..4 {
        let port = pot.port;
        tasks.push(tokio::spawn(async move {
            let user = format!("user{i}");
            let prompt = format!("{user}@e2e-host:~$ ");
            let handle = connect(port, &user, "pw").await;
            let channel = handle.channel_open_session().await.unwrap();
            channel.request_shell(true).await.unwrap();
            let mut stream = channel.into_stream();
            read_until(&mut stream, &prompt, Duration::from_secs(5)).await;
            stream.write_all(b"whoami\r").await.unwrap();
            read_until(&mut stream, &prompt, Duration::from_secs(5)).await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let out = task.await.unwrap();
        assert!(out.contains(&format!("user{i}\r\n")), "{out}");
    }
    assert_eq!(pot.commands().len(), 4);
}

type ClientChannel = russh::Channel<russh::client::Msg>;

/// Wait for the next data message on `channel`.
async fn next_data(channel: &mut ClientChannel) -> Option<String> {
    while let Some(msg) = channel.wait().await {
        if let russh::ChannelMsg::Data { data } = msg {
            return Some(String::from_utf8_lossy(&data).into_owned());
        }
    }
    None
}

/// Collect channel data until `needle` shows up or the channel ends.
async fn collect_until(channel: &mut ClientChannel, needle: &str, out: &mut String) {
    while !out.contains(needle) {
        match next_data(channel).await {
            Some(data) => out.push_str(&data),
            None => break,
        }
    }
}

/// Send one SSH data message per byte and wait for each echo, like a
/// person typing into an interactive client.
async fn type_keys(channel: &mut ClientChannel, keys: &[u8], out: &mut String) {
    for &b in keys {
        channel.data(&[b][..]).await.unwrap();
        if let Some(data) = next_data(channel).await {
            out.push_str(&data);
        }
    }
}

#[tokio::test]
async fn test_one_message_per_keystroke() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let mut channel = handle.channel_open_session().await.unwrap();
    channel.request_shell(true).await.unwrap();

    let mut out = String::new();
    collect_until(&mut channel, PROMPT, &mut out).await;
    out.clear();

    let session = async {
        // Well past russh's per-channel queue of 100 messages
        type_keys(&mut channel, &[b'x'; 150], &mut out).await;
        type_keys(&mut channel, b"\x03whoami\r", &mut out).await;
        collect_until(&mut channel, &format!("whoami\r\nadmin\r\n{PROMPT}"), &mut out).await;
    };
    tokio::time::timeout(Duration::from_secs(10), session)
        .await
        .expect("whoami answered after 150 keystrokes");

    assert!(out.starts_with(&"x".repeat(150)), "{out}");
    assert!(out.ends_with(&format!("x^C\r\n{PROMPT}whoami\r\nadmin\r\n{PROMPT}")), "{out}");
    assert_eq!(pot.commands(), vec!["whoami"]);
}

#[tokio::test]
async fn test_input_before_shell_request_is_kept() {
    let pot = start_honeypot().await;
    let handle = connect(pot.port, "admin", "admin123").await;
    let mut channel = handle.channel_open_session().await.unwrap();

    for &b in b"id\r" {
        channel.data(&[b][..]).await.unwrap();
    }
    for _ in 0..120 {
        channel.data(&b"y"[..]).await.unwrap();
    }
    channel.data(&b"\x03hostname\r"[..]).await.unwrap();
    channel.request_shell(true).await.unwrap();

    let mut out = String::new();
    let needle = format!("hostname\r\ne2e-host\r\n{PROMPT}");
    tokio::time::timeout(
        Duration::from_secs(10),
        collect_until(&mut channel, &needle, &mut out),
    )
    .await
    .expect("queued input processed once the shell started");
    assert!(out.contains("uid=1000(admin)"), "{out}");
    assert!(out.ends_with(&needle), "{out}");
    assert_eq!(pot.commands(), vec!["id", "hostname"]);
}
