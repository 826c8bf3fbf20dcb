mod common;

use cl_demo::{session, ClError, Retrieval, Session, TEST_DATA};
use common::{config, device_available};

#[test]
fn copy_kernel_returns_input_via_map() {
    if !device_available() {
        return;
    }
    let cfg = config("test.cl").with_retrieval(Retrieval::Map);
    let values = session::run(&cfg).unwrap();
    assert_eq!(values, TEST_DATA);
    assert_eq!(
        session::format_results(&values),
        "1.000000 2.000000 3.000000 4.000000 5.000000 6.000000 7.000000 8.000000"
    );
}

#[test]
fn read_and_map_retrieval_agree() {
    if !device_available() {
        return;
    }
    let session = Session::create(&config("double.cl"))
        .unwrap()
        .bind_arguments()
        .unwrap()
        .execute()
        .unwrap();

    let read = session.retrieve_with(Retrieval::Read).unwrap();
    let mapped = session.retrieve_with(Retrieval::Map).unwrap();
    assert_eq!(read, mapped);
    assert_eq!(read, TEST_DATA.map(|x| 2.0 * x));
    session.release();
}

#[test]
fn buffers_report_at_least_requested_size() {
    if !device_available() {
        return;
    }
    let session = Session::create(&config("test.cl")).unwrap();
    let want = TEST_DATA.len() * std::mem::size_of::<f32>();
    for buf in [session.input(), session.output()] {
        assert_eq!(buf.len(), TEST_DATA.len());
        assert_eq!(buf.size_bytes(), want);
        assert!(buf.allocated_size().unwrap() >= want);
    }
    assert_eq!(session.input().tag(), "in_buf");
    assert_eq!(session.output().tag(), "out_buf");
    assert!(session.kernel_info().work_group_size >= 1);
    assert!(!session.platform().name().unwrap().is_empty());
    assert!(!session.device().name().unwrap().is_empty());
    session.release();
}

#[test]
fn syntax_error_is_a_build_failure_with_log() {
    if !device_available() {
        return;
    }
    let err = Session::create(&config("syntax_error.cl")).unwrap_err();
    match err {
        ClError::BuildFailed { log } => assert!(!log.trim().is_empty()),
        other => panic!("expected build failure, got {other}"),
    }
}

#[test]
fn missing_entry_point_is_an_api_error() {
    if !device_available() {
        return;
    }
    let mut cfg = config("test.cl");
    cfg.entry_point = "no_such_kernel".into();
    let err = Session::create(&cfg).unwrap_err();
    assert!(
        matches!(err, ClError::Api { op: "clCreateKernel", .. }),
        "{err}"
    );
    assert_eq!(err.status_name(), Some("CL_INVALID_KERNEL_NAME"));
}

#[test]
fn invalid_build_options_are_not_a_build_failure() {
    if !device_available() {
        return;
    }
    let mut cfg = config("test.cl");
    cfg.build_options = "-this-is-not-an-option".into();
    match Session::create(&cfg) {
        // manche Compiler ignorieren unbekannte Optionen
        Ok(s) => s.release(),
        Err(ClError::Compile { status }) => assert_ne!(status.0, -11),
        Err(ClError::BuildFailed { .. }) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_kernel_file_fails_with_path() {
    if !device_available() {
        return;
    }
    let err = Session::create(&config("not_there.cl")).unwrap_err();
    assert!(err.to_string().contains("not_there.cl"), "{err}");
    assert!(err.os_code().is_some());
}
