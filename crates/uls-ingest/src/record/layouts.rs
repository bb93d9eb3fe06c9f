//! Published ULS public-access layouts.
//!
//! Offsets count from the first field AFTER the record-type marker, so
//! `system_id` is offset 0 in every layout.

record_layouts! {
    /// `HD` application/license header.
    License(LicenseRow) {
        0 => system_id: Text,
        1 => uls_file_number: Text,
        2 => ebf_number: Text,
        3 => call_sign: Text,
        4 => license_status: Text,
        5 => radio_service_code: Text,
        6 => grant_date: Text,
        7 => expired_date: Text,
        8 => cancellation_date: Text,
        9 => eligibility_rule_num: Text,
        10 => applicant_type_code_reserved: Text,
        11 => alien: Text,
        12 => alien_government: Text,
        13 => alien_corporation: Text,
        14 => alien_officer: Text,
        15 => alien_control: Text,
        16 => revoked: Text,
        17 => convicted: Text,
        18 => adjudged: Text,
        19 => involved_reserved: Text,
        20 => common_carrier: Text,
        21 => non_common_carrier: Text,
        22 => private_comm: Text,
        23 => fixed: Text,
        24 => mobile: Text,
        25 => radiolocation: Text,
        26 => satellite: Text,
        27 => developmental_or_sta: Text,
        28 => interconnected_service: Text,
        29 => certifier_first_name: Text,
        30 => certifier_mi: Text,
        31 => certifier_last_name: Text,
        32 => certifier_suffix: Text,
        33 => certifier_title: Text,
        34 => gender: Text,
        35 => african_american: Text,
        36 => native_american: Text,
        37 => hawaiian: Text,
        38 => asian: Text,
        39 => white: Text,
        40 => ethnicity: Text,
        41 => effective_date: Text,
        42 => last_action_date: Text,
        43 => auction_id: Text,
        44 => reg_stat_broad_serv: Text,
        45 => band_manager: Text,
        46 => type_serv_broad_serv: Text,
        47 => alien_ruling: Text,
        48 => licensee_name_change: Text,
        49 => whitespace_ind: Text,
        50 => additional_cert_choice: Text,
        51 => additional_cert_answer: Text,
        52 => discontinuation_ind: Text,
        53 => regulatory_compliance_ind: Text,
        54 => eligibility_cert_900: Text,
        55 => transition_plan_cert_900: Text,
        56 => return_spectrum_cert_900: Text,
        57 => payment_cert_900: Text,
    }

    /// `EN` licensee, contact and related entities.
    Entity(EntityRow) {
        0 => system_id: Text,
        1 => uls_file_number: Text,
        2 => ebf_number: Text,
        3 => call_sign: Text,
        4 => entity_type: Text,
        5 => licensee_id: Text,
        6 => entity_name: Text,
        7 => first_name: Text,
        8 => mi: Text,
        9 => last_name: Text,
        10 => suffix: Text,
        11 => phone: Text,
        12 => fax: Text,
        13 => email: Text,
        14 => street_address: Text,
        15 => city: Text,
        16 => state: Text,
        17 => zip_code: Text,
        18 => po_box: Text,
        19 => attention_line: Text,
        20 => sgin: Text,
        21 => frn: Text,
        22 => applicant_type_code: Text,
        23 => applicant_type_other: Text,
        24 => status_code: Text,
        25 => status_date: Text,
        26 => lic_category_code: Text,
        27 => linked_system_id: Text,
        28 => linked_call_sign: Text,
    }

    /// `FR` assigned frequency.
    Frequency(FrequencyRow) {
        0 => system_id: Text,
        1 => uls_file_number: Text,
        2 => ebf_number: Text,
        3 => call_sign: Text,
        4 => frequency_action_performed: Text,
        5 => location_number: Integer,
        6 => antenna_number: Integer,
        7 => class_station_code: Text,
        8 => op_altitude_code: Text,
        9 => frequency_assigned: Real,
        10 => frequency_upper_band: Real,
        11 => frequency_carrier: Real,
        12 => time_begin_operations: Integer,
        13 => time_end_operations: Integer,
        14 => power_output: Real,
        15 => power_erp: Real,
        16 => tolerance: Real,
        17 => frequency_ind: Text,
        18 => status: Text,
        19 => eirp: Real,
        20 => transmitter_make: Text,
        21 => transmitter_model: Text,
        22 => auto_transmitter_power_control: Text,
        23 => cnt_mobile_units: Integer,
        24 => cnt_mob_pagers: Integer,
        25 => freq_seq_id: Integer,
        26 => status_code: Text,
        27 => status_date: Text,
        28 => date_first_used: Text,
    }

    /// `LO` transmitter or operating location.
    Location(LocationRow) {
        0 => system_id: Text,
        1 => uls_file_number: Text,
        2 => ebf_number: Text,
        3 => call_sign: Text,
        4 => location_action_performed: Text,
        5 => location_type_code: Text,
        6 => location_class_code: Text,
        7 => location_number: Integer,
        8 => site_status: Text,
        9 => corresponding_fixed_location: Integer,
        10 => location_address: Text,
        11 => location_city: Text,
        12 => location_county: Text,
        13 => location_state: Text,
        14 => radius_of_operation: Real,
        15 => area_of_operation_code: Text,
        16 => clearance_indicator: Text,
        17 => ground_elevation: Real,
        18 => lat_degrees: Real,
        19 => lat_minutes: Real,
        20 => lat_seconds: Real,
        21 => lat_direction: Text,
        22 => long_degrees: Real,
        23 => long_minutes: Real,
        24 => long_seconds: Real,
        25 => long_direction: Text,
        26 => max_lat_degrees: Real,
        27 => max_lat_minutes: Real,
        28 => max_lat_seconds: Real,
        29 => max_lat_direction: Text,
        30 => max_long_degrees: Real,
        31 => max_long_minutes: Real,
        32 => max_long_seconds: Real,
        33 => max_long_direction: Text,
        34 => nepa: Text,
        35 => quiet_zone_notification_date: Text,
        36 => tower_registration_number: Text,
        37 => height_of_support_structure: Real,
        38 => overall_height_of_structure: Real,
        39 => structure_type: Text,
        40 => airport_id: Text,
        41 => location_name: Text,
        42 => units_hand_held: Integer,
        43 => units_mobile: Integer,
        44 => units_temp_fixed: Integer,
        45 => units_aircraft: Integer,
        46 => units_itinerant: Integer,
        47 => status_code: Text,
        48 => status_date: Text,
        49 => earth_station_agreement: Text,
    }

    /// `AN` antenna.
    Antenna(AntennaRow) {
        0 => system_id: Text,
        1 => uls_file_number: Text,
        2 => ebf_number: Text,
        3 => call_sign: Text,
        4 => antenna_action_performed: Text,
        5 => antenna_number: Integer,
        6 => location_number: Integer,
        7 => receive_zone_code: Text,
        8 => antenna_type_code: Text,
        9 => height_to_tip: Real,
        10 => height_to_center_raat: Real,
        11 => antenna_make: Text,
        12 => antenna_model: Text,
        13 => tilt: Real,
        14 => polarization_code: Text,
        15 => beamwidth: Real,
        16 => gain: Real,
        17 => azimuth: Real,
        18 => height_above_avg_terrain: Real,
        19 => diversity_height: Real,
        20 => diversity_gain: Real,
        21 => diversity_beam: Real,
        22 => reflector_height: Real,
        23 => reflector_width: Real,
        24 => reflector_separation: Real,
        25 => repeater_seq_num: Integer,
        26 => back_to_back_tx_dish_gain: Real,
        27 => back_to_back_rx_dish_gain: Real,
        28 => location_name: Text,
        29 => passive_repeater_id: Integer,
        30 => alternative_cgsa_method: Text,
        31 => path_number: Integer,
        32 => line_loss: Real,
        33 => status_code: Text,
        34 => status_date: Text,
        35 => psd_nonpsd_methodology: Text,
        36 => maximum_erp: Real,
    }

    /// `AP` application purpose.
    ApplicationPurpose(ApplicationPurposeRow) {
        0 => system_id: Text,
        1 => uls_file_number: Text,
        2 => ebf_number: Text,
        3 => call_sign: Text,
        4 => purpose_code: Text,
        5 => status_code: Text,
        6 => status_date: Text,
    }
}
