//! Canned output for the command table. Every line ends in CRLF.

use super::RenderContext;

pub(super) const UPTIME: &str =
    " 09:15:27 up 15 days, 7:23, 1 user, load average: 0.00, 0.01, 0.05\r\n";

pub(super) const IFCONFIG: &str = concat!(
    "eth0: flags=4163<UP,BROADCAST,RUNNING,MULTICAST>  mtu 1500\r\n",
    "        inet 10.0.2.15  netmask 255.255.255.0  broadcast 10.0.2.255\r\n",
    "        inet6 fe80::a00:27ff:fe73:60cf  prefixlen 64  scopeid 0x20<link>\r\n",
    "        ether 08:00:27:73:60:cf  txqueuelen 1000  (Ethernet)\r\n",
    "        RX packets 963  bytes 91521 (91.5 KB)\r\n",
    "        RX errors 0  dropped 0  overruns 0  frame 0\r\n",
    "        TX packets 649  bytes 96318 (96.3 KB)\r\n",
    "        TX errors 0  dropped 0 overruns 0  carrier 0  collisions 0\r\n",
    "\r\n",
    "lo: flags=73<UP,LOOPBACK,RUNNING>  mtu 65536\r\n",
    "        inet 127.0.0.1  netmask 255.0.0.0\r\n",
    "        inet6 ::1  prefixlen 128  scopeid 0x10<host>\r\n",
    "        loop  txqueuelen 1000  (Local Loopback)\r\n",
    "        RX packets 182  bytes 13832 (13.8 KB)\r\n",
    "        RX errors 0  dropped 0  overruns 0  frame 0\r\n",
    "        TX packets 182  bytes 13832 (13.8 KB)\r\n",
    "        TX errors 0  dropped 0 overruns 0  carrier 0  collisions 0\r\n",
);

pub(super) fn whoami(ctx: &RenderContext) -> String {
    format!("{}\r\n", ctx.username)
}

pub(super) fn hostname(ctx: &RenderContext) -> String {
    format!("{}\r\n", ctx.hostname)
}

pub(super) fn id(ctx: &RenderContext) -> String {
    let u = ctx.username;
    format!(
        "uid=1000({u}) gid=1000({u}) groups=1000({u}),4(adm),24(cdrom),27(sudo),30(dip),46(plugdev),120(lpadmin),131(lxd),132(sambashare)\r\n"
    )
}

pub(super) fn uname(ctx: &RenderContext) -> String {
    format!(
        "Linux {} 5.4.0-146-generic #163-Ubuntu SMP Fri Mar 17 18:26:02 UTC 2023 x86_64 x86_64 x86_64 GNU/Linux\r\n",
        ctx.hostname
    )
}

pub(super) fn pwd(ctx: &RenderContext) -> String {
    format!("/home/{}\r\n", ctx.username)
}

pub(super) fn ls(ctx: &RenderContext) -> String {
    let u = ctx.username;
    [
        "total 32".to_string(),
        format!("drwxr-xr-x 4 {u} {u} 4096 Apr 18 09:14 ."),
        "drwxr-xr-x 3 root     root     4096 Jan 15 12:32 ..".to_string(),
        format!("-rw------- 1 {u} {u}  220 Jan 15 12:32 .bash_history"),
        format!("-rw-r--r-- 1 {u} {u} 3771 Jan 15 12:32 .bashrc"),
        format!("drwx------ 2 {u} {u} 4096 Jan 15 12:34 .cache"),
        format!("-rw-r--r-- 1 {u} {u}  807 Jan 15 12:32 .profile"),
        format!("drwxrwxr-x 2 {u} {u} 4096 Apr 18 09:14 .ssh"),
        format!("-rw-r--r-- 1 {u} {u}    0 Jan 15 12:34 .sudo_as_admin_successful"),
        format!("-rw------- 1 {u} {u}  945 Apr 18 09:10 .viminfo"),
    ]
    .iter()
    .map(|l| format!("{l}\r\n"))
    .collect()
}

pub(super) fn ps(ctx: &RenderContext) -> String {
    let u = ctx.username;
    [
        "USER         PID %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND".to_string(),
        "root           1  0.0  0.2 168860 11492 ?        Ss   Apr17   0:04 /sbin/init".to_string(),
        "root           2  0.0  0.0      0     0 ?        S    Apr17   0:00 [kthreadd]".to_string(),
        "root         546  0.0  0.6  72172 25868 ?        Ss   Apr17   0:00 /usr/sbin/sshd -D".to_string(),
        "root         565  0.0  0.3 235520 14120 ?        Ssl  Apr17   0:00 /usr/sbin/rsyslogd -n".to_string(),
        "root         566  0.0  0.0   6812  2972 tty1     Ss+  Apr17   0:00 /sbin/agetty -o -p -- \\u --noclear tty1 linux".to_string(),
        format!("{u}      1328  0.0  0.1  19216  5144 pts/0    Ss   09:10   0:00 -bash"),
        format!("{u}      1392  0.0  0.1  36084  3704 pts/0    R+   09:15   0:00 ps aux"),
    ]
    .iter()
    .map(|l| format!("{l}\r\n"))
    .collect()
}

pub(super) fn passwd(ctx: &RenderContext) -> String {
    let u = ctx.username;
    let gecos = capitalize(u);
    format!(
        "root:x:0:0:root:/root:/bin/bash\r\n\
         daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin\r\n\
         bin:x:2:2:bin:/bin:/usr/sbin/nologin\r\n\
         sys:x:3:3:sys:/dev:/usr/sbin/nologin\r\n\
         {u}:x:1000:1000:{gecos}:/home/{u}:/bin/bash\r\n\
         sshd:x:110:65534::/run/sshd:/usr/sbin/nologin\r\n"
    )
}

pub(super) fn who(ctx: &RenderContext) -> String {
    let now = chrono::Local::now().format("%H:%M:%S");
    format!(
        " {now} up 15 days, 7:23, 1 user, load average: 0.00, 0.01, 0.05\r\n\
         USER     TTY      FROM             LOGIN@   IDLE   JCPU   PCPU WHAT\r\n\
         {}    pts/0    10.0.2.2          09:10    0.00s  0.04s  0.00s w\r\n",
        ctx.username
    )
}

pub(super) fn etc_hostname(hostname: &str) -> String {
    format!("{hostname}\r\n")
}

pub(super) fn etc_hosts(hostname: &str) -> String {
    format!(
        "127.0.0.1 localhost\r\n\
         127.0.1.1 {hostname}\r\n\
         \r\n\
         # The following lines are desirable for IPv6 capable hosts\r\n\
         ::1     ip6-localhost ip6-loopback\r\n\
         fe00::0 ip6-localnet\r\n\
         ff00::0 ip6-mcastprefix\r\n\
         ff02::1 ip6-allnodes\r\n\
         ff02::2 ip6-allrouters\r\n"
    )
}

/// First letter upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
