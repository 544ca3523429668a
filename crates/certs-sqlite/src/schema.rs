pub const MIG_0001_INIT: &str = r#"
BEGIN;

CREATE TABLE certs (
  host      TEXT NOT NULL,
  port      INTEGER NOT NULL CHECK (port BETWEEN 1 AND 65535),
  dnsnames  TEXT NOT NULL DEFAULT '',
  emails    TEXT NOT NULL DEFAULT '',
  ipaddrs   TEXT NOT NULL DEFAULT '',
  uris      TEXT NOT NULL DEFAULT '',
  subnames  TEXT NOT NULL DEFAULT '',
  PRIMARY KEY (host, port)
);

COMMIT;
"#;
