//! Tests for the `dbal` command line front end.

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use std::fs;
    use tempfile::TempDir;

    fn dbal() -> Command {
        let mut cmd = Command::cargo_bin("dbal").unwrap();
        cmd.env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn test_missing_arguments_prints_usage() {
        let output = dbal().output().unwrap();

        assert_eq!(output.status.code(), Some(2));
        assert!(String::from_utf8_lossy(&output.stderr).contains("usage: dbal"));
    }

    #[test]
    fn test_write_then_read_and_list_tables() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("cli.db");
        let db = db.to_str().unwrap();

        let created = dbal()
            .args([db, "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"])
            .output()
            .unwrap();
        assert!(created.status.success());

        let inserted = dbal()
            .args([db, "INSERT INTO users (name) VALUES ('alice'), ('bob')"])
            .output()
            .unwrap();
        assert!(inserted.status.success());
        assert_eq!(String::from_utf8_lossy(&inserted.stdout).trim(), "ok: 2 row(s) affected");

        let selected = dbal()
            .args([db, "SELECT id, name FROM users ORDER BY id"])
            .output()
            .unwrap();
        assert!(selected.status.success());
        assert_eq!(
            String::from_utf8_lossy(&selected.stdout),
            "{\"id\":1,\"name\":\"alice\"}\n{\"id\":2,\"name\":\"bob\"}\n"
        );

        let tables = dbal().arg(db).output().unwrap();
        assert!(tables.status.success());
        assert_eq!(String::from_utf8_lossy(&tables.stdout), "users\n");
    }

    #[test]
    fn test_config_file_target() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("dbal.toml");
        let db_path = dir.path().join("configured.db");
        fs::write(
            &config_path,
            format!(
                "[database]\nuser = \"app\"\ndatabase = \"{}\"\n\n[logging]\nlevel = \"error\"\n",
                db_path.display()
            ),
        )
        .unwrap();

        let output = dbal()
            .args([config_path.to_str().unwrap(), "SELECT 1 AS one"])
            .output()
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "{\"one\":1}\n");
        assert!(db_path.exists());
    }

    #[test]
    fn test_failing_statement_exits_with_error() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("err.db");

        let output = dbal()
            .args([db.to_str().unwrap(), "SELECT * FROM nowhere"])
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("no such table"));
    }
}
